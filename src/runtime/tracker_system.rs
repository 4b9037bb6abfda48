use crate::clients::TrackingClient;
use crate::coordinator::{TrackingActor, TrackingContext};
use crate::runtime::TrackerConfig;
use tracing::{error, info};

/// Spawns the tracking actor and owns its task.
///
/// # Example
///
/// ```ignore
/// let system = TrackerSystem::new(TrackerConfig::default(), context);
/// system.client.activate("customer-42").await?;
/// // ... deliver push messages ...
/// system.shutdown().await?;
/// ```
pub struct TrackerSystem {
    /// Client for interacting with the tracking actor
    pub client: TrackingClient,

    handle: tokio::task::JoinHandle<()>,
}

impl TrackerSystem {
    pub fn new(config: TrackerConfig, context: TrackingContext) -> Self {
        let (actor, client) = TrackingActor::new(config);
        let handle = tokio::spawn(actor.run(context));
        Self { client, handle }
    }

    /// Disposes the tracker, closes its mailbox and waits for the actor to stop.
    ///
    /// The actor only stops once every clone of the client has been dropped.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down tracker...");

        // Dispose releases the channel and the watchdog before the mailbox closes.
        if let Err(e) = self.client.dispose().await {
            error!(error = %e, "Dispose failed");
        }
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        info!("Tracker shutdown complete.");
        Ok(())
    }
}
