#![allow(dead_code)]

pub mod transport;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tiller_config::LlmConfig;
use tiller_llm::{Llm, Sleeper};

use self::transport::ScriptedTransport;

/// Sleeper that records waits instead of blocking
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Waits requested so far
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Minimal configuration for `model`
pub fn llm_config(model: &str) -> LlmConfig {
    LlmConfig {
        model: model.to_owned(),
        ..LlmConfig::default()
    }
}

/// Client over `transport` that never actually sleeps
pub fn client(config: LlmConfig, transport: &Arc<ScriptedTransport>) -> (Llm, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let llm = Llm::new(config, Arc::clone(transport) as Arc<dyn tiller_llm::Transport>)
        .unwrap()
        .with_sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>);
    (llm, sleeper)
}
