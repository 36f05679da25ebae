use anyhow::Result;
use dreams_types::models::{ConversationRef, UserId};

use crate::Database;
use crate::models::StandupRow;

impl Database {
    /// Open the single standup slot of a conversation. Returns false if a standup
    /// is already running there.
    pub fn start_standup(
        &self,
        conversation: ConversationRef,
        starter: UserId,
        time_finish: i64,
    ) -> Result<bool> {
        self.with_state_mut(|state| {
            if state.standups.contains_key(&conversation) {
                return Ok(false);
            }
            state.standups.insert(
                conversation,
                StandupRow {
                    starter,
                    time_finish,
                    buffer: Vec::new(),
                },
            );
            Ok(true)
        })
    }

    /// Finish time of the active standup, if any.
    pub fn standup_finish(&self, conversation: ConversationRef) -> Result<Option<i64>> {
        self.with_state(|state| Ok(state.standups.get(&conversation).map(|s| s.time_finish)))
    }

    /// Returns false if no standup is active.
    pub fn append_standup_line(&self, conversation: ConversationRef, line: String) -> Result<bool> {
        self.with_state_mut(|state| match state.standups.get_mut(&conversation) {
            Some(standup) => {
                standup.buffer.push(line);
                Ok(true)
            }
            None => Ok(false),
        })
    }

    /// Close the standup and hand back its buffer.
    pub fn take_standup(&self, conversation: ConversationRef) -> Result<Option<StandupRow>> {
        self.with_state_mut(|state| Ok(state.standups.remove(&conversation)))
    }
}
