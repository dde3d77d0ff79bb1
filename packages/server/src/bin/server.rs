//! Yoriai chat relay server.
//!
//! Clients connect to `/ws` and speak JSON-RPC 2.0.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yoriai-server
//! cargo run --bin yoriai-server -- --host 0.0.0.0 --port 3000
//! YORIAI_LOG_LEVEL=info cargo run --bin yoriai-server
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use yoriai_server::{
    config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PUBLIC_HISTORY_LIMIT, ServerConfig},
    domain::{
        ChatRepository, DEFAULT_PUBLIC_CAPACITY, DEFAULT_REPLAY_LIMIT, DEFAULT_THREAD_CAPACITY,
        MessagePusher, StoreLimits,
    },
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository},
    rpc::{IdleSessionSweeper, RpcDispatcher, spawn_event_loop},
    ui::Server,
    usecase::{ExportDataUseCase, GetStorageStatsUseCase},
};
use yoriai_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "yoriai-server")]
#[command(about = "Real-time chat relay speaking JSON-RPC over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "YORIAI_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "YORIAI_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds between idle-session sweeps
    #[arg(long, env = "YORIAI_SWEEP_INTERVAL_SECS", default_value_t = 6 * 60 * 60)]
    sweep_interval_secs: u64,

    /// Seconds a session may stay offline before it is swept
    #[arg(long, env = "YORIAI_SESSION_IDLE_SECS", default_value_t = 24 * 60 * 60)]
    session_idle_secs: u64,

    /// Maximum number of public messages kept
    #[arg(long, env = "YORIAI_PUBLIC_CAPACITY", default_value_t = DEFAULT_PUBLIC_CAPACITY)]
    public_capacity: usize,

    /// Maximum number of messages kept per private thread
    #[arg(long, env = "YORIAI_THREAD_CAPACITY", default_value_t = DEFAULT_THREAD_CAPACITY)]
    thread_capacity: usize,

    /// Messages replayed per private thread by getChatHistory
    #[arg(long, env = "YORIAI_HISTORY_REPLAY_LIMIT", default_value_t = DEFAULT_REPLAY_LIMIT)]
    history_replay_limit: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "YORIAI_LOG_LEVEL", default_value = "debug")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            session_idle_threshold: Duration::from_secs(self.session_idle_secs),
            store_limits: StoreLimits {
                public_capacity: self.public_capacity,
                thread_capacity: self.thread_capacity,
                replay_limit: self.history_replay_limit,
            },
            public_history_limit: DEFAULT_PUBLIC_HISTORY_LIMIT,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = args.into_config();
    tracing::debug!("{:?}", config);

    // Initialize dependencies in order:
    // 1. Repository, MessagePusher, Clock
    // 2. RPC dispatcher and event loop
    // 3. Idle-session sweeper
    // 4. Server

    // 1. Create Repository (in-memory) and MessagePusher (WebSocket implementation)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository: Arc<dyn ChatRepository> = Arc::new(InMemoryChatRepository::with_clock(
        config.store_limits,
        clock.clone(),
    ));
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::default());

    // 2. Create the dispatcher and start the single mutation stream
    let dispatcher = Arc::new(RpcDispatcher::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
        &config,
    ));
    let (events, event_loop) = spawn_event_loop(dispatcher);

    // 3. Start the idle-session sweeper
    let mut sweeper = IdleSessionSweeper::new(events.clone(), config.sweep_interval);
    sweeper.start();

    // 4. Create and run the server
    let server = Server::new(
        events,
        message_pusher,
        Arc::new(GetStorageStatsUseCase::new(repository.clone())),
        Arc::new(ExportDataUseCase::new(repository, clock.clone())),
        clock,
    );
    let result = server.run(config.host, config.port).await;

    sweeper.stop();
    event_loop.abort();

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
