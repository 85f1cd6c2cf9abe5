//! Bot host - Owns the connection, the plugin host and the watcher task

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::application::lifecycle::{LifecycleController, RemoteRegistrySyncClient, WatchLoop};
use crate::application::messaging::MessageDispatcher;
use crate::domain::entities::{create_command_tree, SharedCommandTree};
use crate::domain::traits::{Bot, PluginHost, RemoteRegistry};
use crate::infrastructure::config::Config;
use crate::infrastructure::plugins::{LocalPluginHost, PluginFileIndex, PluginLoader};

/// Back-off after a failed receive before polling the platform again
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Everything one running bot owns.
///
/// Created at startup, consumed by [`BotHost::run`]; the watcher task and
/// the lifecycle state it owns end with it.
pub struct BotHost {
    config: Config,
    bot: Box<dyn Bot>,
    registry: Arc<dyn RemoteRegistry>,
    tree: SharedCommandTree,
    plugins: Arc<LocalPluginHost>,
    ready: watch::Sender<bool>,
    shutdown: watch::Sender<bool>,
    watcher: Option<JoinHandle<LifecycleController>>,
}

impl BotHost {
    pub fn new(config: Config, bot: Box<dyn Bot>, registry: Arc<dyn RemoteRegistry>) -> Self {
        let tree = create_command_tree();
        let loader = PluginLoader::new(&config.plugins.directory, config.plugins.extension.as_str());
        let plugins = Arc::new(LocalPluginHost::new(loader, tree.clone()));

        Self {
            config,
            bot,
            registry,
            tree,
            plugins,
            ready: watch::channel(false).0,
            shutdown: watch::channel(false).0,
            watcher: None,
        }
    }

    /// Connect, start watching plugins once ready, and handle messages until
    /// Ctrl-C or the connection closes.
    pub async fn run(self) -> Result<(), BotError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
        })
        .await
    }

    /// Like [`BotHost::run`], stopping when `shutdown` completes
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), BotError> {
        if self.config.plugins.auto_load {
            self.spawn_watcher();
        } else {
            tracing::info!("Plugin auto-load disabled");
        }

        if let Err(e) = self.bot.start().await {
            self.stop().await;
            return Err(e);
        }

        let info = self.bot.bot_info();
        tracing::info!("Bot started: @{}", info.username);
        self.ready.send_replace(true);

        let result = self.message_loop(shutdown).await;
        self.stop().await;
        result
    }

    fn spawn_watcher(&mut self) {
        let plugins = &self.config.plugins;
        let index = PluginFileIndex::new(&plugins.directory, plugins.extension.as_str());
        let sync = RemoteRegistrySyncClient::new(
            Arc::clone(&self.registry),
            self.tree.clone(),
            self.config.sync.retry_policy(),
        );
        let host: Arc<dyn PluginHost> = self.plugins.clone();
        let controller = LifecycleController::new(host, sync);
        let watch_loop = WatchLoop::new(index, controller, plugins.poll_interval());

        self.watcher = Some(tokio::spawn(
            watch_loop.run(self.ready.subscribe(), self.shutdown.subscribe()),
        ));
    }

    async fn message_loop(&mut self, shutdown: impl Future<Output = ()>) -> Result<(), BotError> {
        let host: Arc<dyn PluginHost> = self.plugins.clone();
        let dispatcher = MessageDispatcher::new(self.config.bot.prefix.as_str(), host);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => return Ok(()),
                batch = self.bot.next_messages() => match batch {
                    Ok(Some(messages)) => {
                        for message in messages {
                            let chat_id = message.chat_id.clone();
                            match dispatcher.dispatch(message) {
                                Ok(Some(reply)) => {
                                    if let Err(e) = self.bot.send_message(&chat_id, &reply).await {
                                        tracing::warn!("Failed to reply in {}: {}", chat_id, e);
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => tracing::error!("Failed to handle message in {}: {}", chat_id, e),
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Connection closed");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to receive messages: {}", e);
                        tokio::select! {
                            _ = &mut shutdown => return Ok(()),
                            _ = tokio::time::sleep(RECEIVE_RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }
    }

    /// Signal the watcher to stop and wait for it
    async fn stop(&mut self) {
        self.shutdown.send_replace(true);

        if let Some(handle) = self.watcher.take() {
            match handle.await {
                Ok(controller) => {
                    let loaded = controller.records().filter(|r| r.is_loaded()).count();
                    tracing::info!("Plugin manager stopped with {} plugins loaded", loaded);
                }
                Err(e) => tracing::error!("Plugin watcher task failed: {}", e),
            }
        }
    }
}
