//! A connection source driven by the test

use async_trait::async_trait;
use connlist::{ConnectionSource, FetchArgs, FetchError, Page};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

type Reply<N> = oneshot::Sender<Result<Page<N>, FetchError>>;

struct Call<N> {
    args: FetchArgs,
    reply: Option<Reply<N>>,
}

pub struct ScriptedSource<N> {
    calls: Mutex<Vec<Call<N>>>,
    notify: Notify,
}

impl<N: Send + Sync + 'static> ScriptedSource<N> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            notify: Notify::new(),
        })
    }

    pub fn as_source(self: &Arc<Self>) -> Arc<dyn ConnectionSource<N>> {
        self.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn args(&self, index: usize) -> FetchArgs {
        self.calls.lock().unwrap()[index].args.clone()
    }

    /// Indices of calls not yet answered.
    pub fn pending(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, call)| call.reply.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Wait until at least `n` fetches have been made.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }

    /// Answer call `index`. Answers to aborted fetches go nowhere.
    pub fn respond(&self, index: usize, page: Page<N>) {
        self.reply(index, Ok(page));
    }

    pub fn fail(&self, index: usize, message: &str) {
        self.reply(index, Err(FetchError::Request(message.to_string())));
    }

    fn reply(&self, index: usize, result: Result<Page<N>, FetchError>) {
        let reply = self.calls.lock().unwrap()[index].reply.take();
        if let Some(tx) = reply {
            let _ = tx.send(result);
        }
    }
}

#[async_trait]
impl<N: Send + Sync + 'static> ConnectionSource<N> for ScriptedSource<N> {
    async fn fetch(&self, args: FetchArgs) -> Result<Page<N>, FetchError> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push(Call {
            args,
            reply: Some(tx),
        });
        self.notify.notify_waiters();
        rx.await
            .unwrap_or_else(|_| Err(FetchError::Unavailable("script dropped the call".into())))
    }
}
