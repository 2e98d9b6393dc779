//! Question/answer pairing over a chronologically ordered message stream.
//!
//! Transcripts usually alternate user and assistant turns, but not always.
//! [`PairBuilder`] holds at most one pending question:
//!
//! | state            | user message                         | assistant message               |
//! |------------------|--------------------------------------|---------------------------------|
//! | idle             | becomes pending                      | emit orphan answer              |
//! | awaiting answer  | emit pending unanswered, new pending | emit complete pair, back to idle |
//!
//! Messages with an unrecognized role are skipped. A question still pending
//! at end of input is emitted unanswered.

use tracing::{debug, trace};

use convarchive_shared::{Message, Pair, Role};

#[derive(Debug, Default)]
enum PairState {
    #[default]
    Idle,
    AwaitingAnswer(String),
}

/// Incremental pair builder. Feed messages in order, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct PairBuilder {
    state: PairState,
    next_index: u64,
    pairs: Vec<Pair>,
}

impl PairBuilder {
    /// Start a builder whose first emitted pair gets `start_index`.
    pub fn new(start_index: u64) -> Self {
        Self {
            state: PairState::Idle,
            next_index: start_index,
            pairs: Vec::new(),
        }
    }

    /// Advance the state machine by one message.
    pub fn push(&mut self, message: &Message) {
        match (std::mem::take(&mut self.state), message.role) {
            (state, Role::Unknown) => {
                trace!(identity = ?message.identity, "skipping message with unknown role");
                self.state = state;
            }
            (PairState::Idle, Role::User) => {
                self.state = PairState::AwaitingAnswer(message.content.clone());
            }
            (PairState::Idle, Role::Assistant) => {
                let index = self.claim_index();
                debug!(index, "answer without a preceding question");
                self.pairs.push(Pair::orphan(index, message.content.clone()));
            }
            (PairState::AwaitingAnswer(pending), Role::User) => {
                let index = self.claim_index();
                debug!(index, "question superseded before an answer arrived");
                self.pairs.push(Pair::unanswered(index, pending));
                self.state = PairState::AwaitingAnswer(message.content.clone());
            }
            (PairState::AwaitingAnswer(pending), Role::Assistant) => {
                let index = self.claim_index();
                self.pairs
                    .push(Pair::complete(index, pending, message.content.clone()));
            }
        }
    }

    /// Flush any pending question and return the pairs in emission order.
    pub fn finish(mut self) -> Vec<Pair> {
        if let PairState::AwaitingAnswer(pending) = std::mem::take(&mut self.state) {
            let index = self.claim_index();
            self.pairs.push(Pair::unanswered(index, pending));
        }
        self.pairs
    }

    fn claim_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }
}

/// Pair an ordered message stream, numbering pairs from `start_index`.
pub fn build_pairs(messages: &[Message], start_index: u64) -> Vec<Pair> {
    let mut builder = PairBuilder::new(start_index);
    for message in messages {
        builder.push(message);
    }
    builder.finish()
}
