use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// How long a checkpoint waits for active transactions to leave, in microseconds.
    pub checkpoint_wait_timeout_us: u64,
    /// How often the checkpoint re-checks the active transactions, in microseconds.
    pub read_txn_poll_interval_us: u64,
    pub enable_compression: bool,
    /// Whether every write commit or rollback is followed by a checkpoint.
    pub auto_checkpoint: bool,
}

impl DatabaseConfig {
    #[inline]
    pub fn checkpoint_wait_timeout(&self) -> Duration {
        Duration::from_micros(self.checkpoint_wait_timeout_us)
    }

    #[inline]
    pub fn read_txn_poll_interval(&self) -> Duration {
        Duration::from_micros(self.read_txn_poll_interval_us)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            checkpoint_wait_timeout_us: 500_000,
            read_txn_poll_interval_us: 500,
            enable_compression: true,
            auto_checkpoint: true,
        }
    }
}
