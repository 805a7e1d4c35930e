//! ルームのライフサイクル: 作成 → エスカレーション → エージェント参加 → 終了（→ 削除）
//! と、接続のバインド・切断処理。

use crate::{
    domain::{
        AgentAssignment, ParticipantId, RepositoryError, Room, RoomId, RoomIdFactory,
        TicketDetails, Timestamp,
    },
    infrastructure::dto::{
        http::RoomSummaryDto,
        websocket::{HumanRequestDto, ServerFrame},
    },
    usecase::{
        error::RouterError,
        registry::{Outbox, Role},
    },
};

use super::Router;

/// Attempts at drawing an unused room id before giving up.
const ROOM_ID_ATTEMPTS: usize = 16;

impl Router {
    /// Open a new room owned by `user_id` and bind the user's connection.
    ///
    /// Returns the `room_created` frame for the caller. Admins receive
    /// `new_chat_room`.
    pub async fn create_room(
        &self,
        user_id: ParticipantId,
        outbox: Outbox,
        user_name: String,
        user_email: Option<String>,
    ) -> Result<ServerFrame, RouterError> {
        self.registry
            .bind(Role::User, user_id.clone(), outbox)
            .await?;

        let created_at = Timestamp::now();
        let mut room = None;
        for _ in 0..ROOM_ID_ATTEMPTS {
            let candidate = Room::new(
                RoomIdFactory::generate()?,
                user_id.clone(),
                user_name.clone(),
                user_email.clone(),
                created_at,
            );
            match self.rooms.insert_room(candidate.clone(), &self.mirror).await {
                Ok(()) => {
                    room = Some(candidate);
                    break;
                }
                Err(RepositoryError::DuplicateRoomId(room_id)) => {
                    tracing::debug!(%room_id, "room id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        let room = room.ok_or(RouterError::RoomIdExhausted {
            attempts: ROOM_ID_ATTEMPTS,
        })?;

        tracing::info!(room_id = %room.id, %user_id, user_name = %room.user_name, "room created");
        let summary = RoomSummaryDto::from(&room);
        let room_id = room.id;
        self.registry
            .broadcast(Role::Admin, &ServerFrame::NewChatRoom { data: summary }, None)
            .await;

        Ok(ServerFrame::RoomCreated {
            room_id: room_id.into_string(),
        })
    }

    /// Escalate a room to the human queue.
    ///
    /// Opens (or replaces) the room's ticket, alerts support, and pushes
    /// `new_request` to every agent. Returns `human_requested` for the caller.
    pub async fn request_human(
        &self,
        room_id: &RoomId,
        details: TicketDetails,
    ) -> Result<ServerFrame, RouterError> {
        let (_, escalation) = self
            .rooms
            .escalate(room_id, details, Timestamp::now(), &self.mirror)
            .await?;
        let request = escalation.request;

        tracing::info!(%room_id, issue = %request.issue, "human agent requested");

        self.spawn_alert(&request);
        let notified = self
            .registry
            .broadcast(
                Role::Agent,
                &ServerFrame::NewRequest {
                    data: HumanRequestDto::from(&request),
                },
                None,
            )
            .await;
        tracing::debug!(%room_id, agents = notified, "new_request broadcast");

        Ok(ServerFrame::HumanRequested {
            room_id: room_id.as_str().to_string(),
        })
    }

    /// Bind an agent connection and return the current pending queue for it.
    pub async fn bind_agent(
        &self,
        agent_id: ParticipantId,
        outbox: Outbox,
    ) -> Result<ServerFrame, RouterError> {
        self.registry
            .bind(Role::Agent, agent_id.clone(), outbox)
            .await?;
        tracing::info!(%agent_id, "agent authenticated");

        let requests = self
            .rooms
            .pending_requests()
            .await
            .iter()
            .map(HumanRequestDto::from)
            .collect();
        Ok(ServerFrame::PendingRequests { requests })
    }

    /// Bind an admin connection. Admins start receiving `new_chat_room` at once.
    pub async fn bind_admin(
        &self,
        admin_id: ParticipantId,
        outbox: Outbox,
    ) -> Result<(), RouterError> {
        self.registry
            .bind(Role::Admin, admin_id.clone(), outbox)
            .await?;
        tracing::info!(%admin_id, "admin connected");
        Ok(())
    }

    /// Claim a pending room for an agent. The first claim wins.
    ///
    /// On success the user receives `human_joined` and the other agents
    /// `request_taken`; nothing is returned to the caller. A lost race, or a
    /// room that is not waiting for an agent, yields `join_rejected`.
    ///
    /// # Errors
    ///
    /// `RouterError::RoomNotFound` if the room does not exist.
    pub async fn agent_join(
        &self,
        room_id: &RoomId,
        agent_id: ParticipantId,
        agent_name: String,
    ) -> Result<Option<ServerFrame>, RouterError> {
        let assignment = AgentAssignment::new(agent_id.clone(), agent_name.clone());
        let routing = match self
            .rooms
            .assign_agent(room_id, assignment, &self.mirror)
            .await
        {
            Ok((routing, _withdrawn)) => routing,
            Err(RepositoryError::Room(reason)) => {
                tracing::info!(%room_id, %agent_id, %reason, "agent join rejected");
                return Ok(Some(ServerFrame::JoinRejected {
                    room_id: room_id.as_str().to_string(),
                    reason: reason.to_string(),
                }));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(%room_id, %agent_id, agent_name, "agent joined");

        self.registry
            .send_to(
                Role::User,
                &routing.user_id,
                &ServerFrame::HumanJoined {
                    agent_name: agent_name.clone(),
                    room_id: room_id.as_str().to_string(),
                },
            )
            .await;
        self.registry
            .broadcast(
                Role::Agent,
                &ServerFrame::RequestTaken {
                    room_id: room_id.as_str().to_string(),
                    agent_name,
                },
                Some(&agent_id),
            )
            .await;
        Ok(None)
    }

    /// Close a room. The user receives `chat_ended`; the room stays listed.
    ///
    /// # Errors
    ///
    /// * `RouterError::RoomNotFound` if the room does not exist
    /// * `RouterError::Room(RoomError::Closed)` if it was already closed
    pub async fn end_chat(&self, room_id: &RoomId, agent_name: String) -> Result<(), RouterError> {
        let (routing, _) = self
            .rooms
            .close_room(room_id, &agent_name, Timestamp::now(), &self.mirror)
            .await?;

        tracing::info!(%room_id, ended_by = agent_name, "chat ended");

        self.registry
            .send_to(
                Role::User,
                &routing.user_id,
                &ServerFrame::ChatEnded {
                    agent_name,
                    room_id: room_id.as_str().to_string(),
                },
            )
            .await;
        Ok(())
    }

    /// Delete a room from the room table and the durable store.
    ///
    /// Always acknowledged, including for rooms that do not exist.
    pub async fn delete_room(&self, room_id: &RoomId) -> ServerFrame {
        match self.rooms.remove_room(room_id, &self.mirror).await {
            Some(room) => tracing::info!(%room_id, status = %room.status, "room deleted"),
            None => tracing::debug!(%room_id, "delete of unknown room acknowledged"),
        }

        ServerFrame::ChatDeleted {
            room_id: room_id.as_str().to_string(),
        }
    }

    /// Drop a connection's binding. Rooms it owned or handled are left as they are.
    pub async fn disconnect(&self, role: Role, id: &ParticipantId) {
        if self.registry.unbind(role, id).await {
            tracing::info!(%role, participant_id = %id, "connection unbound");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        domain::{
            HUMAN_REQUESTED_NOTICE, MockNotifier, NotifyError, Priority, RoomError, RoomStatus,
            SenderRole,
        },
        infrastructure::EchoResponder,
        usecase::router::test_support::{Peer, harness, harness_with, settings},
    };

    fn ticket(issue: &str) -> TicketDetails {
        TicketDetails {
            user_name: "Alice".to_string(),
            user_email: Some("alice@example.com".to_string()),
            issue: issue.to_string(),
        }
    }

    async fn open_room(router: &Router, user: &Peer) -> RoomId {
        let frame = router
            .create_room(
                user.id.clone(),
                user.outbox.clone(),
                "Alice".to_string(),
                Some("alice@example.com".to_string()),
            )
            .await
            .unwrap();
        match frame {
            ServerFrame::RoomCreated { room_id } => RoomId::new(room_id).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_room_is_listed_and_mirrored() {
        // テスト項目: 作成したルームが一覧に現れ、ストアにミラーされ、管理者に通知される
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let mut admin = Peer::new();
        h.router
            .bind_admin(admin.id.clone(), admin.outbox.clone())
            .await
            .unwrap();

        // when (操作):
        let room_id = open_room(&h.router, &user).await;
        h.router.flush_mirror().await;

        // then (期待する結果):
        assert!(room_id.as_str().starts_with("room_"));
        let rooms = h.router.list_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].status, RoomStatus::Active);
        assert!(h.store.room(&room_id).await.is_some());
        match admin.next_frame().await {
            ServerFrame::NewChatRoom { data } => {
                assert_eq!(data.room_id, room_id.as_str());
                assert_eq!(data.user_name, "Alice");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_room_ids_are_unique() {
        // テスト項目: 作成されるルーム ID は互いに重複しない
        // given (前提条件):
        let h = harness();
        let user = Peer::new();

        // when (操作):
        let mut ids = std::collections::HashSet::new();
        for _ in 0..50 {
            ids.insert(open_room(&h.router, &user).await);
        }

        // then (期待する結果):
        assert_eq!(ids.len(), 50);
        assert_eq!(h.router.list_rooms().await.len(), 50);
    }

    #[tokio::test]
    async fn test_request_human_escalates_and_notifies_once() {
        // テスト項目: request_human で pending になり、全エージェントに new_request、通知は 1 回
        // given (前提条件):
        let (alerted_tx, mut alerted_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_alert()
            .withf(|recipient, subject, body| {
                recipient == "support@example.com"
                    && subject == "New Support Request: Alice"
                    && body.contains("Issue: billing dispute")
            })
            .times(1)
            .returning(move |_, _, _| {
                let _ = alerted_tx.send(());
                Ok(())
            });
        let h = harness_with(
            Arc::new(notifier),
            Arc::new(EchoResponder::new()),
            settings(),
        );
        let user = Peer::new();
        let mut agent_a = Peer::new();
        let mut agent_b = Peer::new();
        h.router
            .bind_agent(agent_a.id.clone(), agent_a.outbox.clone())
            .await
            .unwrap();
        h.router
            .bind_agent(agent_b.id.clone(), agent_b.outbox.clone())
            .await
            .unwrap();
        let room_id = open_room(&h.router, &user).await;

        // when (操作):
        let frame = h
            .router
            .request_human(&room_id, ticket("billing dispute"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            frame,
            ServerFrame::HumanRequested {
                room_id: room_id.as_str().to_string()
            }
        );
        let room = h.router.room_snapshot(&room_id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Pending);
        assert_eq!(room.messages.last().unwrap().sender, SenderRole::System);
        assert_eq!(
            room.messages.last().unwrap().content.as_str(),
            HUMAN_REQUESTED_NOTICE
        );
        let pending = h.router.pending_requests().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].priority, Priority::Medium);

        for agent in [&mut agent_a, &mut agent_b] {
            match agent.next_frame().await {
                ServerFrame::NewRequest { data } => {
                    assert_eq!(data.room_id, room_id.as_str());
                    assert_eq!(data.issue, "billing dispute");
                }
                other => panic!("unexpected frame: {other:?}"),
            }
        }

        tokio::time::timeout(std::time::Duration::from_secs(1), alerted_rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_human_survives_alert_failure() {
        // テスト項目: 通知が失敗してもエスカレーションは成立する
        // given (前提条件):
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_alert()
            .returning(|_, _, _| Err(NotifyError::Delivery("relay refused".to_string())));
        let h = harness_with(
            Arc::new(notifier),
            Arc::new(EchoResponder::new()),
            settings(),
        );
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;

        // when (操作):
        let result = h.router.request_human(&room_id, ticket("refund")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(h.router.pending_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_request_human_twice_keeps_one_ticket() {
        // テスト項目: pending 中の再リクエストはチケットを置き換え、1 件だけ残る
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .request_human(&room_id, ticket("first"))
            .await
            .unwrap();

        // when (操作):
        h.router
            .request_human(&room_id, ticket("second"))
            .await
            .unwrap();

        // then (期待する結果):
        let pending = h.router.pending_requests().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].issue, "second");
    }

    #[tokio::test]
    async fn test_request_human_unknown_room() {
        // テスト項目: 存在しないルームへの request_human は RoomNotFound
        // given (前提条件):
        let h = harness();
        let room_id = RoomId::new("room_ffffff".to_string()).unwrap();

        // when (操作):
        let result = h.router.request_human(&room_id, ticket("x")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RouterError::RoomNotFound(room_id)));
    }

    #[tokio::test]
    async fn test_bind_agent_returns_pending_queue() {
        // テスト項目: エージェント認証時に保留中のチケット一覧が返る
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .request_human(&room_id, ticket("refund"))
            .await
            .unwrap();
        let agent = Peer::new();

        // when (操作):
        let frame = h
            .router
            .bind_agent(agent.id.clone(), agent.outbox.clone())
            .await
            .unwrap();

        // then (期待する結果):
        match frame {
            ServerFrame::PendingRequests { requests } => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].room_id, room_id.as_str());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_agent_join_notifies_user_and_other_agents() {
        // テスト項目: 参加成功でユーザーに human_joined、他エージェントに request_taken
        // given (前提条件):
        let h = harness();
        let mut user = Peer::new();
        let mut agent_a = Peer::new();
        let mut agent_b = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .bind_agent(agent_a.id.clone(), agent_a.outbox.clone())
            .await
            .unwrap();
        h.router
            .bind_agent(agent_b.id.clone(), agent_b.outbox.clone())
            .await
            .unwrap();
        h.router
            .request_human(&room_id, ticket("refund"))
            .await
            .unwrap();
        agent_a.next_frame().await; // new_request
        agent_b.next_frame().await; // new_request

        // when (操作):
        let reply = h
            .router
            .agent_join(&room_id, agent_a.id.clone(), "Bob".to_string())
            .await
            .unwrap();
        h.router.flush_mirror().await;

        // then (期待する結果):
        assert_eq!(reply, None);
        assert_eq!(
            user.next_frame().await,
            ServerFrame::HumanJoined {
                agent_name: "Bob".to_string(),
                room_id: room_id.as_str().to_string()
            }
        );
        assert_eq!(
            agent_b.next_frame().await,
            ServerFrame::RequestTaken {
                room_id: room_id.as_str().to_string(),
                agent_name: "Bob".to_string()
            }
        );
        agent_a.assert_idle();

        let room = h.router.room_snapshot(&room_id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Active);
        assert_eq!(room.agent_name(), Some("Bob"));
        assert!(h.router.pending_requests().await.is_empty());
        let mirrored = h.store.room(&room_id).await.unwrap();
        assert_eq!(mirrored.agent.unwrap().agent_name, "Bob");
    }

    #[tokio::test]
    async fn test_concurrent_agent_join_has_one_winner() {
        // テスト項目: 同じルームへの同時参加は 1 人だけが成功し、もう 1 人は join_rejected
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .request_human(&room_id, ticket("refund"))
            .await
            .unwrap();
        let agent_a = Peer::new();
        let agent_b = Peer::new();

        // when (操作):
        let (ra, rb) = tokio::join!(
            {
                let router = h.router.clone();
                let room_id = room_id.clone();
                let id = agent_a.id.clone();
                tokio::spawn(async move { router.agent_join(&room_id, id, "A".to_string()).await })
            },
            {
                let router = h.router.clone();
                let room_id = room_id.clone();
                let id = agent_b.id.clone();
                tokio::spawn(async move { router.agent_join(&room_id, id, "B".to_string()).await })
            }
        );
        let ra = ra.unwrap().unwrap();
        let rb = rb.unwrap().unwrap();

        // then (期待する結果):
        let outcomes = [&ra, &rb];
        let winners = outcomes.iter().filter(|r| r.is_none()).count();
        let rejected = outcomes
            .iter()
            .filter(|r| matches!(r, Some(ServerFrame::JoinRejected { .. })))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(rejected, 1);

        let room = h.router.room_snapshot(&room_id).await.unwrap();
        let winner_id = if ra.is_none() { &agent_a.id } else { &agent_b.id };
        assert_eq!(&room.agent.unwrap().agent_id, winner_id);
        assert!(h.router.pending_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_agent_join_on_active_room_is_rejected() {
        // テスト項目: エスカレーションされていないルームへの参加は拒否される
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;

        // when (操作):
        let reply = h
            .router
            .agent_join(&room_id, Peer::new().id, "Bob".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(matches!(reply, Some(ServerFrame::JoinRejected { .. })));
        assert_eq!(
            h.router.room_snapshot(&room_id).await.unwrap().agent,
            None
        );
    }

    #[tokio::test]
    async fn test_agent_join_unknown_room() {
        // テスト項目: 存在しないルームへの参加は RoomNotFound
        // given (前提条件):
        let h = harness();
        let room_id = RoomId::new("room_000000".to_string()).unwrap();

        // when (操作):
        let result = h
            .router
            .agent_join(&room_id, Peer::new().id, "Bob".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RouterError::RoomNotFound(room_id)));
    }

    #[tokio::test]
    async fn test_end_chat_closes_room() {
        // テスト項目: end_chat でルームが closed になり、ユーザーに chat_ended、システムメッセージが追加される
        // given (前提条件):
        let h = harness();
        let mut user = Peer::new();
        let agent = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .request_human(&room_id, ticket("refund"))
            .await
            .unwrap();
        h.router
            .agent_join(&room_id, agent.id.clone(), "Bob".to_string())
            .await
            .unwrap();
        user.next_frame().await; // human_joined

        // when (操作):
        h.router.end_chat(&room_id, "Bob".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            user.next_frame().await,
            ServerFrame::ChatEnded {
                agent_name: "Bob".to_string(),
                room_id: room_id.as_str().to_string()
            }
        );
        let room = h.router.room_snapshot(&room_id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Closed);
        assert_eq!(room.agent, None);
        let last = room.messages.last().unwrap();
        assert_eq!(last.sender, SenderRole::System);
        assert_eq!(last.content.as_str(), "Chat ended by Bob");
        assert_eq!(h.router.list_rooms().await.len(), 1);
    }

    #[tokio::test]
    async fn test_end_chat_twice_is_rejected_without_side_effects() {
        // テスト項目: 終了済みルームへの end_chat はエラーになり、通知もメッセージも増えない
        // given (前提条件):
        let h = harness();
        let mut user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router.end_chat(&room_id, "Bob".to_string()).await.unwrap();
        user.next_frame().await; // chat_ended
        let before = h.router.room_snapshot(&room_id).await.unwrap().messages.len();

        // when (操作):
        let result = h.router.end_chat(&room_id, "Bob".to_string()).await;

        // then (期待する結果):
        assert_eq!(result, Err(RouterError::Room(RoomError::Closed)));
        let after = h.router.room_snapshot(&room_id).await.unwrap().messages.len();
        assert_eq!(before, after);
        user.assert_idle();
    }

    #[tokio::test]
    async fn test_request_human_on_closed_room_fails() {
        // テスト項目: 終了済みルームはエスカレーションできない
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router.end_chat(&room_id, "Bob".to_string()).await.unwrap();

        // when (操作):
        let result = h.router.request_human(&room_id, ticket("again")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RouterError::Room(RoomError::Closed)));
        assert!(h.router.pending_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_room_removes_everywhere_and_acks() {
        // テスト項目: delete_chat でルーム表とストアから削除され、未知のルームでも ack が返る
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;
        h.router
            .request_human(&room_id, ticket("refund"))
            .await
            .unwrap();

        // when (操作):
        let ack = h.router.delete_room(&room_id).await;
        let ack_again = h.router.delete_room(&room_id).await;
        h.router.flush_mirror().await;

        // then (期待する結果):
        let expected = ServerFrame::ChatDeleted {
            room_id: room_id.as_str().to_string(),
        };
        assert_eq!(ack, expected);
        assert_eq!(ack_again, expected);
        assert!(h.router.list_rooms().await.is_empty());
        assert!(h.router.pending_requests().await.is_empty());
        assert!(h.store.room(&room_id).await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_keeps_rooms() {
        // テスト項目: 切断しても接続の登録が外れるだけでルームは残る
        // given (前提条件):
        let h = harness();
        let user = Peer::new();
        let room_id = open_room(&h.router, &user).await;

        // when (操作):
        h.router.disconnect(Role::User, &user.id).await;

        // then (期待する結果):
        assert!(h.router.room_snapshot(&room_id).await.is_ok());
        assert!(h.router.registry.lookup(Role::User, &user.id).await.is_none());
    }
}
