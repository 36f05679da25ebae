use std::time::Duration;

use tracing::{debug, info};

use dreams_types::api::StandupStatus;
use dreams_types::events::DreamsEvent;
use dreams_types::models::{ChannelId, ConversationRef};

use crate::engine::{Engine, check_length};
use crate::error::{EngineError, EngineResult};
use crate::scheduler::TaskKey;

impl Engine {
    /// Open a standup window of `length` seconds in a channel. Lines sent while
    /// it is open are posted as one message from the caller when it closes.
    /// Returns the closing time in seconds since the epoch.
    pub fn standup_start(&self, token: &str, channel_id: ChannelId, length: i64) -> EngineResult<i64> {
        let conversation = ConversationRef::Channel(channel_id);
        self.require_conversation(conversation)?;
        let user_id = self.authenticate(token)?;
        self.require_member(conversation, user_id)?;
        if length < 0 {
            return Err(EngineError::validation("Standup length must not be negative"));
        }

        let time_finish = chrono::Utc::now()
            .timestamp()
            .checked_add(length)
            .ok_or_else(|| EngineError::validation("Standup length is too large"))?;
        if !self.inner.store.start_standup(conversation, user_id, time_finish)? {
            return Err(EngineError::validation(format!(
                "A standup is already running in {}",
                conversation
            )));
        }

        let engine = self.clone();
        let scheduled = self.inner.scheduler.schedule(
            TaskKey::Standup(conversation),
            user_id,
            Duration::from_secs(length as u64),
            async move { engine.finish_standup(conversation) },
        );
        if let Err(e) = scheduled {
            self.inner.store.take_standup(conversation)?;
            return Err(e);
        }

        info!("User {} started a {}s standup in {}", user_id, length, conversation);
        Ok(time_finish)
    }

    /// Whether a standup is running in the channel. Any valid session may ask.
    pub fn standup_active(&self, token: &str, channel_id: ChannelId) -> EngineResult<StandupStatus> {
        let conversation = ConversationRef::Channel(channel_id);
        self.require_conversation(conversation)?;
        self.authenticate(token)?;

        let time_finish = self.inner.store.standup_finish(conversation)?;
        Ok(StandupStatus {
            is_active: time_finish.is_some(),
            time_finish,
        })
    }

    /// Buffer one line, prefixed with the sender's handle, for the running standup.
    pub fn standup_send(&self, token: &str, channel_id: ChannelId, line: &str) -> EngineResult<()> {
        let conversation = ConversationRef::Channel(channel_id);
        self.require_conversation(conversation)?;
        let user_id = self.authenticate(token)?;
        self.require_member(conversation, user_id)?;
        if self.inner.store.standup_finish(conversation)?.is_none() {
            return Err(no_standup(conversation));
        }
        check_length(line)?;

        let entry = format!("{}: {}", self.handle(user_id)?, line);
        if !self.inner.store.append_standup_line(conversation, entry)? {
            // Closed between the check and the append.
            return Err(no_standup(conversation));
        }
        debug!("User {} added a standup line in {}", user_id, conversation);
        Ok(())
    }

    fn finish_standup(&self, conversation: ConversationRef) {
        let standup = match self.inner.store.take_standup(conversation) {
            Ok(Some(standup)) => standup,
            Ok(None) => {
                debug!("Standup in {} already closed", conversation);
                return;
            }
            Err(e) => {
                self.dead_letter(None, conversation, e.to_string());
                return;
            }
        };

        // Posted as one message even when nobody sent a line.
        let body = standup.buffer.join("\n");
        if let Err(e) = check_length(&body) {
            self.dead_letter(None, conversation, e.to_string());
            self.publish(DreamsEvent::StandupFinish {
                conversation,
                message_id: None,
            });
            return;
        }

        match self
            .inner
            .store
            .create_message(standup.starter, conversation, &body, false)
        {
            Ok(message) => {
                info!(
                    "Standup in {} posted as message {} ({} lines)",
                    conversation,
                    message.message_id,
                    standup.buffer.len()
                );
                self.after_create(&message);
                self.publish(DreamsEvent::StandupFinish {
                    conversation,
                    message_id: Some(message.message_id),
                });
            }
            Err(e) => self.dead_letter(None, conversation, e.to_string()),
        }
    }
}

fn no_standup(conversation: ConversationRef) -> EngineError {
    EngineError::validation(format!("No standup is running in {}", conversation))
}
