//! Bot server: command dispatch, the Discord event loop, the auto-catch
//! ticker and the console mode.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bot::commands::{parse_command, parse_component, Command};
use crate::bot::render;
use crate::bot::reply::Reply;
use crate::config::{Config, TOKEN_ENV_VAR};
use crate::discord::model::{
    display_name, interaction_response, message_body, presence_update, suspense_body, Interaction,
    Message, INTENTS, INTERACTION_MESSAGE_COMPONENT,
};
use crate::discord::{self, DiscordHttp, GatewayConfig, GatewayEvent};
use crate::game::auto_catch::AutoCatchNotice;
use crate::game::engine::GameEngine;
use crate::game::errors::GameError;
use crate::game::types::UpgradeLadder;
use crate::logutil::{escape_log, mask_secret};
use crate::storage::Store;

/// Who issued a command and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub user_id: String,
    pub display_name: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Clone)]
pub struct BotServer {
    config: Arc<Config>,
    engine: Arc<GameEngine>,
}

impl BotServer {
    /// Open the store under `storage.data_dir` and build the engine.
    pub fn new(config: Config) -> Result<Self> {
        let path = config.storage.db_path();
        let store = Store::open(&path)
            .map_err(|e| anyhow!("Failed to open store at {}: {}", path.display(), e))?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Store) -> Self {
        let engine = GameEngine::new(store, config.game.clone());
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn prefix(&self) -> &str {
        &self.config.bot.command_prefix
    }

    fn suspense_delay(&self) -> Duration {
        Duration::from_millis(self.config.game.catch_suspense_ms)
    }

    /// Run one command. Internal failures are logged and masked.
    pub fn handle(&self, inv: &Invocation, cmd: &Command, now: DateTime<Utc>) -> Reply {
        match self.dispatch(inv, cmd, now) {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_user_facing() {
                    debug!("{} for {} rejected: {}", cmd.name(), inv.user_id, e);
                } else {
                    error!("{} for {} failed: {}", cmd.name(), inv.user_id, e);
                }
                render::error(&e, self.prefix())
            }
        }
    }

    fn dispatch(&self, inv: &Invocation, cmd: &Command, now: DateTime<Utc>) -> Result<Reply, GameError> {
        let engine = &self.engine;
        let prefix = self.prefix();
        let user = inv.user_id.as_str();
        let name = inv.display_name.as_deref();

        let reply = match cmd {
            Command::Help => render::help(prefix),
            Command::Catch => render::catch_result(&engine.catch(user, name, now)?),
            Command::Balance => {
                let player = engine.player(user, name)?;
                render::balance(&player, &player.label())
            }
            Command::Bag => {
                let player = engine.player(user, name)?;
                render::bag(&player, &player.label())
            }
            Command::Profile => {
                let player = engine.player(user, name)?;
                render::profile(&player, &player.label())
            }
            Command::Daily => render::daily(&engine.daily(user, name, now)?),
            Command::Bestiary => render::bestiary(&engine.player(user, name)?),
            Command::Leaderboard => {
                render::leaderboard(&engine.leaderboard(self.config.game.leaderboard_size)?)
            }
            Command::ExchangeRates => render::exchange_rates(prefix),
            Command::Exchange { step, amount: None } => render::exchange_usage(*step, prefix),
            Command::Exchange {
                step,
                amount: Some(amount),
            } => render::exchange_done(&engine.exchange(user, name, *step, *amount)?),
            Command::Sell(None) => render::sell_usage(prefix),
            Command::Sell(Some(species)) => render::sold(&engine.sell(user, name, species)?),
            Command::Shop => render::shop(prefix),
            Command::Buy(None) => render::buy_usage(prefix),
            Command::Buy(Some(item)) => {
                let report = engine.buy(user, name, item, inv.channel_id.as_deref(), now)?;
                render::purchased(&report, now)
            }
            Command::Upgrade(None) => render::upgrades(&engine.player(user, name)?, prefix),
            Command::Upgrade(Some(raw)) => {
                let ladder = UpgradeLadder::from_key(raw)
                    .ok_or_else(|| GameError::UnknownItem(raw.clone()))?;
                render::upgraded(&engine.upgrade(user, name, ladder)?)
            }
            Command::Buffs => render::buff_list(&engine.active_buffs(user, now)?, now),
        };
        Ok(reply)
    }

    /// Background hunter ticks. Notices arrive on the returned receiver.
    fn spawn_auto_catch(&self) -> Option<(JoinHandle<()>, mpsc::Receiver<AutoCatchNotice>)> {
        if !self.config.auto_catch.enabled {
            info!("Auto-catch disabled");
            return None;
        }
        let (tx, rx) = mpsc::channel(64);
        let engine = Arc::clone(&self.engine);
        let period = Duration::from_secs(self.config.auto_catch.poll_interval_secs.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = Utc::now();
                engine.prune_cooldowns(now);
                match engine.auto_catch_tick(now) {
                    Ok(summary) => {
                        for notice in summary.notices {
                            if tx.send(notice).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => error!("Auto-catch tick failed: {}", e),
                }
            }
        });
        Some((handle, rx))
    }

    /// Connect to Discord and serve until Ctrl-C or a fatal gateway close.
    pub async fn run(&self) -> Result<()> {
        let token = self
            .config
            .bot
            .resolve_token()
            .ok_or_else(|| anyhow!("No Discord token: set {} or bot.token", TOKEN_ENV_VAR))?;
        info!(
            "{} starting (prefix '{}', token {})",
            self.config.bot.name,
            self.prefix(),
            mask_secret(&token)
        );

        let http = DiscordHttp::new(token.clone())?;
        let mut gateway = discord::connect(GatewayConfig {
            token,
            intents: INTENTS,
        });
        let (ticker, mut notices) = match self.spawn_auto_catch() {
            Some((handle, rx)) => (Some(handle), Some(rx)),
            None => (None, None),
        };

        let mut ready = false;
        let mut known_guilds: HashSet<String> = HashSet::new();
        loop {
            tokio::select! {
                event = gateway.events.recv() => {
                    let Some(event) = event else {
                        warn!("Gateway stopped");
                        break;
                    };
                    match event {
                        GatewayEvent::Ready(r) => {
                            known_guilds.extend(r.guilds.iter().map(|g| g.id.clone()));
                            ready = true;
                            info!("Online as {} in {} servers", r.user.username, r.guilds.len());
                            if gateway.sender.send(presence_update(self.prefix())).await.is_err() {
                                warn!("Could not queue presence update");
                            }
                        }
                        GatewayEvent::GuildCreate(guild) => {
                            if known_guilds.insert(guild.id.clone()) && ready {
                                info!("Joined guild {}", guild.name.as_deref().unwrap_or(&guild.id));
                                if let Some(channel) = guild.welcome_channel() {
                                    let body = message_body(&render::welcome(self.prefix()));
                                    if let Err(e) = http.create_message(&channel, &body).await {
                                        warn!("Welcome message to {} failed: {}", channel, e);
                                    }
                                }
                            }
                        }
                        GatewayEvent::MessageCreate(msg) => {
                            if msg.author.bot {
                                continue;
                            }
                            if let Some(cmd) = parse_command(self.prefix(), &msg.content) {
                                let server = self.clone();
                                let http = http.clone();
                                tokio::spawn(async move { server.answer_message(&http, msg, cmd).await });
                            }
                        }
                        GatewayEvent::InteractionCreate(interaction) => {
                            let server = self.clone();
                            let http = http.clone();
                            tokio::spawn(async move { server.answer_interaction(&http, interaction).await });
                        }
                        _ => {}
                    }
                }
                Some(notice) = next_notice(&mut notices) => {
                    if let Some(channel) = notice.channel_id.clone() {
                        let body = message_body(&render::auto_catch(&notice));
                        if let Err(e) = http.create_message(&channel, &body).await {
                            warn!("Auto-catch notice to {} failed: {}", channel, e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        if let Some(handle) = ticker {
            handle.abort();
        }
        gateway.driver.abort();
        Ok(())
    }

    async fn answer_message(&self, http: &DiscordHttp, msg: Message, cmd: Command) {
        let inv = Invocation {
            user_id: msg.author.id.clone(),
            display_name: Some(display_name(&msg.author, msg.member.as_ref())),
            channel_id: Some(msg.channel_id.clone()),
        };
        debug!("{} <- {}", inv.user_id, escape_log(&msg.content));
        let reply = self.handle(&inv, &cmd, Utc::now());

        let sent = match &reply.suspense {
            Some(line) => match http.create_message(&msg.channel_id, &suspense_body(line)).await {
                Ok(posted) => {
                    tokio::time::sleep(self.suspense_delay()).await;
                    http.edit_message(&posted.channel_id, &posted.id, &message_body(&reply))
                        .await
                }
                Err(e) => Err(e),
            },
            None => http
                .create_message(&msg.channel_id, &message_body(&reply))
                .await
                .map(|_| ()),
        };
        if let Err(e) = sent {
            warn!("Reply to {} in {} failed: {}", cmd.name(), msg.channel_id, e);
        }
    }

    async fn answer_interaction(&self, http: &DiscordHttp, interaction: Interaction) {
        if interaction.kind != INTERACTION_MESSAGE_COMPONENT {
            return;
        }
        let data = interaction.data.clone().unwrap_or_default();
        let Some(cmd) = data
            .custom_id
            .as_deref()
            .and_then(|id| parse_component(id, &data.values))
        else {
            return;
        };
        let Some(user) = interaction.invoker() else {
            return;
        };
        let inv = Invocation {
            user_id: user.id.clone(),
            display_name: Some(display_name(user, interaction.member.as_ref())),
            channel_id: interaction.channel_id.clone(),
        };
        debug!("{} <- component {}", inv.user_id, cmd.name());
        let reply = self.handle(&inv, &cmd, Utc::now());

        let sent = match &reply.suspense {
            Some(line) => {
                let first = interaction_response(suspense_body(line), reply.ephemeral);
                match http
                    .interaction_callback(&interaction.id, &interaction.token, &first)
                    .await
                {
                    Ok(()) => {
                        tokio::time::sleep(self.suspense_delay()).await;
                        http.edit_original_response(
                            &interaction.application_id,
                            &interaction.token,
                            &message_body(&reply),
                        )
                        .await
                    }
                    Err(e) => Err(e),
                }
            }
            None => {
                let body = interaction_response(message_body(&reply), reply.ephemeral);
                http.interaction_callback(&interaction.id, &interaction.token, &body)
                    .await
            }
        };
        if let Err(e) = sent {
            warn!("Interaction reply for {} failed: {}", cmd.name(), e);
        }
    }

    /// Play from the terminal as `user_id`. Commands may omit the prefix.
    pub async fn run_console(&self, user_id: &str, name: Option<&str>) -> Result<()> {
        let inv = Invocation {
            user_id: user_id.to_string(),
            display_name: name.map(str::to_string),
            channel_id: None,
        };
        println!("{}", render::welcome(self.prefix()).to_plain_text());
        println!("Type commands (e.g. `catch`), `quit` to leave.\n");

        let (ticker, mut notices) = match self.spawn_auto_catch() {
            Some((handle, rx)) => (Some(handle), Some(rx)),
            None => (None, None),
        };
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                        break;
                    }
                    let with_prefix = format!("{}{}", self.prefix(), line);
                    let cmd = parse_command(self.prefix(), line)
                        .or_else(|| parse_command(self.prefix(), &with_prefix));
                    let Some(cmd) = cmd else {
                        println!("Unknown command. Try `help`.");
                        continue;
                    };
                    let reply = self.handle(&inv, &cmd, Utc::now());
                    if let Some(suspense) = &reply.suspense {
                        println!("{}", suspense);
                        tokio::time::sleep(self.suspense_delay()).await;
                    }
                    println!("{}\n", reply.to_plain_text());
                }
                Some(notice) = next_notice(&mut notices) => {
                    println!("{}\n", render::auto_catch(&notice).to_plain_text());
                }
            }
        }

        if let Some(handle) = ticker {
            handle.abort();
        }
        Ok(())
    }

    pub fn show_status(&self) -> Result<()> {
        let store = self.engine.store();
        println!("=== {} Status ===", self.config.bot.name);
        println!("Command prefix: '{}'", self.prefix());
        println!(
            "Discord token: {}",
            self.config
                .bot
                .resolve_token()
                .map(|t| mask_secret(&t))
                .unwrap_or_else(|| "not configured".to_string())
        );
        println!("Data directory: {}", self.config.storage.data_dir);
        println!("Players: {}", store.player_count());
        println!(
            "Auto-catch: {} (every {}s)",
            if self.config.auto_catch.enabled { "enabled" } else { "disabled" },
            self.config.auto_catch.poll_interval_secs
        );
        let now = Utc::now();
        println!("Active hunters: {}", store.get_auto_catch_buffs(now)?.len());
        for entry in self.engine.leaderboard(3)? {
            println!(
                "  #{} {} ({} acorns, {} catches)",
                entry.rank, entry.label, entry.total_value, entry.total_catches
            );
        }
        Ok(())
    }
}

async fn next_notice(rx: &mut Option<mpsc::Receiver<AutoCatchNotice>>) -> Option<AutoCatchNotice> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
