use std::time::Duration;

use crate::session::QuerySession;

/// Waits (up to five seconds) until `predicate` holds for the session.
pub async fn wait_until<F>(session: &QuerySession, predicate: F)
where
    F: Fn(&QuerySession) -> bool,
{
    let mut changes = session.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if predicate(session) {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    })
    .await
    .expect("session condition not reached within 5s");
}
