//! Two players and a bot fight a short scripted round.
//!
//! Heroes come from `heroes/`, settings from `herowars.ron`. Progress is kept
//! in memory unless `HEROWARS_DB` names a database file.

mod behaviors;

use herowars_core::{
    AbilityKey, Cmd, Config, Engine, GameEvent, GameTime, Notification, PlayerId, UpdateResult,
};
use herowars_db::Store;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LANGUAGE: &str = "en";

/// Minimal host: prints commands and replays scheduled notifications.
struct Host {
    engine: Engine,
    now: GameTime,
    scheduled: Vec<(GameTime, Notification)>,
}

impl Host {
    fn run(&mut self, label: &str, result: UpdateResult) {
        println!("== {label} @ {}ms", self.now.as_millis());
        for notification in &result.fired {
            println!("   fired {} -> {}", notification.event, notification.player);
        }
        for cmd in result.cmd.iter() {
            match cmd {
                Cmd::Say {
                    player,
                    source,
                    message,
                    tokens,
                } => {
                    let source = source.as_ref().map(AbilityKey::as_str).unwrap_or("core");
                    println!("   say {player} [{source}] {message} {tokens:?}");
                }
                Cmd::Apply {
                    target,
                    effect,
                    params,
                } => println!("   apply {effect} on {target} {params:?}"),
                Cmd::ShowMenu { player, menu } => println!("   menu {menu:?} for {player}"),
                Cmd::Schedule {
                    notification,
                    delay,
                } => {
                    let due = self.now + *delay;
                    println!("   schedule {} in {delay:?}", notification.event);
                    self.scheduled.push((due, notification.clone()));
                }
                Cmd::None | Cmd::Batch(_) => {}
            }
        }
    }

    fn dispatch(&mut self, event: GameEvent) -> Result<(), Box<dyn Error>> {
        let label = event.name().to_string();
        let result = self.engine.dispatch(event, self.now)?;
        self.run(&label, result);
        Ok(())
    }

    fn notify(&mut self, notification: Notification) -> Result<(), Box<dyn Error>> {
        let label = notification.event.to_string();
        let result = self.engine.notify(notification, self.now)?;
        self.run(&label, result);
        Ok(())
    }

    /// Move the clock forward, delivering everything that comes due.
    fn advance(&mut self, secs: u64) -> Result<(), Box<dyn Error>> {
        self.now = self.now + Duration::from_secs(secs);
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|(at, _)| *at <= self.now);
        self.scheduled = later;
        for (_, notification) in due {
            self.notify(notification)?;
        }
        Ok(())
    }

    fn upgrade(&mut self, player: PlayerId, key: &str) -> Result<(), Box<dyn Error>> {
        let key = AbilityKey::new(key);
        if !self.engine.can_upgrade(player, &key)? {
            tracing::warn!(%player, skill = %key, "upgrade not allowed");
            return Ok(());
        }
        let result = self.engine.upgrade_skill(player, &key, self.now)?;
        self.run(&format!("upgrade {key}"), result);
        Ok(())
    }

    fn summary(&self, player: PlayerId) -> Result<(), Box<dyn Error>> {
        let info = self.engine.hero_info(player, LANGUAGE)?;
        println!(
            "   {player}: {} level {} xp {}/{} points {}",
            info.name,
            info.level,
            info.xp,
            info.required_xp
                .map_or_else(|| "max".to_string(), |xp| xp.to_string()),
            info.skill_points
        );
        for row in self.engine.skill_menu(player, LANGUAGE)? {
            println!(
                "     {:<24} {}/{:?}{}",
                row.name,
                row.level,
                row.max_level,
                if row.ultimate { " (ultimate)" } else { "" }
            );
        }
        Ok(())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn open_store() -> Result<Store, Box<dyn Error>> {
    match std::env::var_os("HEROWARS_DB") {
        Some(path) => Ok(Store::open(path)?),
        None => Ok(Store::in_memory()?),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = Config::load(root.join("herowars.ron"))?;
    let registry = herowars_script::load(root.join(&config.heroes_dir), &behaviors::catalog())?;
    tracing::info!(heroes = registry.len(), "content loaded");

    let engine = Engine::new(Arc::new(registry), config, Box::new(open_store()?)).with_seed(7);
    let mut host = Host {
        engine,
        now: GameTime::ZERO,
        scheduled: Vec::new(),
    };

    let alice = PlayerId(1);
    let bob = PlayerId(2);
    let bot = PlayerId(3);
    for (id, account, is_bot) in [
        (alice, "steam:1", false),
        (bob, "steam:2", false),
        (bot, "bot:1", true),
    ] {
        let result = host.engine.connect(id, account, is_bot, host.now)?;
        host.run(&format!("connect {account}"), result);
    }

    // Alice levels paladin far enough for the ultimate.
    let result = host.engine.grant_xp(alice, 1200, host.now)?;
    host.run("grant_xp", result);
    for skill in [
        "paladin.condemn",
        "paladin.condemn",
        "paladin.saints_cloak",
        "paladin.martyr",
        "paladin.god_mode",
    ] {
        host.upgrade(alice, skill)?;
    }
    host.summary(alice)?;

    // Bob earns the assassin.
    let result = host.engine.set_hero_level(bob, 6, host.now)?;
    host.run("set_hero_level", result);
    let result = host
        .engine
        .change_hero(bob, &AbilityKey::new("assassin"), host.now)?;
    host.run("change_hero", result);
    let result = host.engine.set_hero_level(bob, 8, host.now)?;
    host.run("set_hero_level", result);
    for skill in [
        "assassin.sharp_blade",
        "assassin.leap",
        "assassin.meditation",
        "assassin.total_vanish",
    ] {
        host.upgrade(bob, skill)?;
    }
    host.summary(bob)?;

    for id in [alice, bob, bot] {
        host.dispatch(GameEvent::solo("player_spawn", id))?;
    }

    host.dispatch(GameEvent::duo("take_damage", Some(bob), Some(alice)).with_arg("damage", 25))?;
    host.dispatch(GameEvent::duo("player_hurt", Some(alice), Some(bob)).with_arg("damage", 20))?;
    host.notify(Notification::new("player_ultimate", alice))?;
    host.notify(Notification::new("player_ultimate", bob))?;
    host.advance(3)?;
    host.dispatch(GameEvent::duo("player_death", Some(bob), Some(alice)))?;
    host.advance(3)?;
    host.dispatch(GameEvent::duo("player_death", Some(alice), Some(bot)))?;

    host.summary(alice)?;
    host.summary(bob)?;

    host.engine.disconnect(bot)?;
    host.engine.shutdown()?;
    tracing::info!("round finished");
    Ok(())
}
