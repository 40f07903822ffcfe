//! The assistant side of a conversation.

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;

/// Default lower bound of the simulated reply latency.
pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound of the simulated reply latency.
pub const MAX_DELAY: Duration = Duration::from_secs(3);

const REPLIES: &[&str] = &[
    "That's an interesting question. Let me think about it for a moment.",
    "Here's how I would approach it: break the problem into smaller steps and tackle them one at a time.",
    "Good point! There are a few ways to look at this.",
    "I understand. Could you tell me a bit more about what you're trying to achieve?",
    "Sure, happy to help with that.",
    "That makes sense. One thing worth keeping in mind is that the details often matter more than they seem.",
];

const IMAGE_REPLIES: &[&str] = &[
    "Thanks for the image! I can see what you've shared. What would you like to know about it?",
    "Nice picture. Tell me what you'd like me to focus on.",
];

/// Produces the assistant's reply to a prompt.
pub trait Responder: Send + Sync {
    /// Replies to `prompt`, optionally accompanied by an image reference.
    fn respond(
        &self,
        prompt: &str,
        image: Option<&str>,
    ) -> impl std::future::Future<Output = String> + Send;
}

/// Responder that waits a random delay and returns a canned reply.
#[derive(Debug, Clone)]
pub struct SimulatedResponder {
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for SimulatedResponder {
    fn default() -> Self {
        Self::new(MIN_DELAY, MAX_DELAY)
    }
}

impl SimulatedResponder {
    /// Creates a responder whose delay is drawn from `min..=max`.
    ///
    /// The bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        if min_delay <= max_delay {
            Self {
                min_delay,
                max_delay,
            }
        } else {
            Self {
                min_delay: max_delay,
                max_delay: min_delay,
            }
        }
    }

    /// Delay bounds.
    #[must_use]
    pub const fn delay_range(&self) -> (Duration, Duration) {
        (self.min_delay, self.max_delay)
    }
}

impl Responder for SimulatedResponder {
    async fn respond(&self, prompt: &str, image: Option<&str>) -> String {
        // ThreadRng is not Send; draw everything before the first await.
        let (delay, reply) = {
            let mut rng = rand::rng();
            let delay = rng.random_range(self.min_delay..=self.max_delay);
            let pool = if image.is_some() { IMAGE_REPLIES } else { REPLIES };
            let reply = pool.choose(&mut rng).copied().unwrap_or_default();
            (delay, reply.to_string())
        };
        tracing::debug!(
            prompt_len = prompt.len(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "assistant replying"
        );
        tokio::time::sleep(delay).await;
        reply
    }
}
