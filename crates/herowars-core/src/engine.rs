//! The event-routing engine
//!
//! Owns the connected players, the shared type registry and the persistence
//! collaborator for one server session. All state changes go through the
//! engine's operations, each handled to completion before returning.
//!
//! ## Dispatch
//!
//! A routed notification runs, in order: `BeforeAbilities` reactions, the
//! active hero's callback, each live skill's callback, then `AfterAbilities`
//! reactions. Follow-up notifications emitted along the way are queued and
//! routed afterwards. A follow-up that repeats any (player, event) pair in
//! its own causal chain fails with [`Error::ReentrantDispatch`].
//!
//! Failures are not rolled back. Once any command was collected or any
//! notification routed, the error comes wrapped in [`Error::Dispatch`] with
//! the effects that already happened; [`Error::root_cause`] reaches the
//! underlying failure.

use crate::ability::HeroType;
use crate::budget;
use crate::callback::Outbox;
use crate::cmd::{Cmd, Menu};
use crate::config::Config;
use crate::display::{self, HeroInfo, HeroRow, SkillRow};
use crate::error::{Error, Illegal, Result};
use crate::event::{self, names, GameEvent, Notification};
use crate::hero::Hero;
use crate::identity::{AbilityKey, EventName, PlayerId};
use crate::level::LevelChange;
use crate::persistence::{self, Persistence, SkillRecord};
use crate::player::{Player, PlayerSettings, Roster};
use crate::reaction::{self, Phase, Reaction, ReactionCtx};
use crate::registry::TypeRegistry;
use crate::rng::GameRng;
use crate::routing::{self, Delivery};
use crate::skill::Skill;
use crate::time::GameTime;
use crate::value::{EventArgs, Value};
use crate::variable::VariableRange;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Result of an engine operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateResult {
    /// Commands for the host to execute
    pub cmd: Cmd,
    /// Every notification routed, in routing order
    pub fired: Vec<Notification>,
}

impl UpdateResult {
    /// Check whether a notification with this event was routed to `player`
    pub fn fired(&self, player: PlayerId, event: &str) -> bool {
        self.fired
            .iter()
            .any(|n| n.player == player && n.event == event)
    }
}

struct Pending {
    notification: Notification,
    chain: Vec<(PlayerId, EventName)>,
}

/// One server session's engine
pub struct Engine {
    registry: Arc<TypeRegistry>,
    config: Config,
    persistence: Box<dyn Persistence>,
    players: IndexMap<PlayerId, Player>,
    reactions: Vec<Box<dyn Reaction>>,
    rng: GameRng,
}

impl Engine {
    /// Create an engine with the default reactions
    pub fn new(
        registry: Arc<TypeRegistry>,
        config: Config,
        persistence: Box<dyn Persistence>,
    ) -> Self {
        let reactions = reaction::defaults(&config);
        Self {
            registry,
            config,
            persistence,
            players: IndexMap::new(),
            reactions,
            rng: GameRng::default(),
        }
    }

    /// Seed the RNG exposed to callbacks
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = GameRng::new(seed);
        self
    }

    /// Register another reaction after the existing ones
    pub fn add_reaction(&mut self, reaction: Box<dyn Reaction>) {
        self.reactions.push(reaction);
    }

    /// Drop every reaction, leaving bare hero/skill dispatch
    pub fn clear_reactions(&mut self) {
        self.reactions.clear();
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(Error::UnknownPlayer(id))
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(&id).ok_or(Error::UnknownPlayer(id))
    }

    // ---- session lifecycle ----

    /// Bring a player into the session
    ///
    /// Restores stored heroes and the stored active hero, or hands out the
    /// starting hero to a new account. The active hero's skills are built,
    /// their levels restored and init callbacks run.
    pub fn connect(
        &mut self,
        id: PlayerId,
        account: impl Into<String>,
        is_bot: bool,
        now: GameTime,
    ) -> Result<UpdateResult> {
        if self.players.contains_key(&id) {
            return Err(Error::PlayerAlreadyConnected(id));
        }
        let mut player = Player::new(id, account);
        player.is_bot = is_bot;

        let record = if is_bot {
            None
        } else {
            self.persistence.load_player(&player.account)?
        };
        let curve = self.config.xp.curve();
        let mut active = None;
        let exists = record.is_some();
        if let Some(record) = record {
            player.settings = record.settings;
            for stored in record.heroes {
                let Some(ty) = self.registry.get(&stored.key) else {
                    tracing::warn!(account = %player.account, hero = %stored.key, "stored hero type no longer exists, skipped");
                    continue;
                };
                match Hero::restore(Arc::clone(ty), curve, stored.id, stored.level, stored.xp) {
                    Ok(hero) => {
                        if record.active_hero == Some(stored.id) {
                            active = Some(hero.key().clone());
                        }
                        player.insert_hero(hero);
                    }
                    Err(e) => {
                        tracing::warn!(account = %player.account, hero = %stored.key, error = %e, "stored hero rejected")
                    }
                }
            }
        }

        let active = match active.or_else(|| player.heroes().keys().next().cloned()) {
            Some(key) => key,
            None => {
                let ty = Arc::clone(self.registry.starting_hero(&self.config)?);
                let mut hero = Hero::new(ty, curve);
                if !is_bot {
                    if exists {
                        self.persistence.save_hero(&player.account, &mut hero)?;
                        self.persistence.save_player(
                            &player.account,
                            hero.record_id(),
                            &player.settings,
                        )?;
                    } else {
                        self.persistence.create_player(&player.account, &mut hero)?;
                    }
                }
                let key = hero.key().clone();
                player.insert_hero(hero);
                key
            }
        };
        player.set_active(&active)?;

        let skills = self.prepared_skills(&player, &active)?;
        player.hero_mut()?.install_skills(skills);

        tracing::info!(player = %id, account = %player.account, hero = %active, bot = is_bot, "player connected");

        let mut out = Outbox::new();
        routing::invoke_init(
            &mut player,
            Delivery {
                now,
                roster: Roster::new(&self.players),
                rng: &mut self.rng,
                out: &mut out,
            },
        )?;
        let info = HeroInfo::new(player.hero()?, display::DEFAULT_LANGUAGE);
        out.push(hero_info_cmd(id, &info));
        self.players.insert(id, player);
        self.run(Vec::new(), now, out)
    }

    /// Save and remove a player
    ///
    /// The player stays connected if the save fails.
    pub fn disconnect(&mut self, id: PlayerId) -> Result<()> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(Error::UnknownPlayer(id))?;
        persistence::save_progress(&mut *self.persistence, player)?;
        self.players.shift_remove(&id);
        tracing::info!(player = %id, "player disconnected");
        Ok(())
    }

    /// Save every connected player, returning the first failure
    pub fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;
        for player in self.players.values_mut() {
            if let Err(e) = persistence::save_progress(&mut *self.persistence, player) {
                tracing::error!(player = %player.id, error = %e, "failed to save player on shutdown");
                first_error.get_or_insert(e);
            }
        }
        tracing::info!(players = self.players.len(), "engine shut down");
        first_error.map_or(Ok(()), Err)
    }

    /// Replace a player's settings
    pub fn set_settings(&mut self, id: PlayerId, settings: PlayerSettings) -> Result<()> {
        self.player_mut(id)?.settings = settings;
        Ok(())
    }

    // ---- event routing ----

    /// Route a raw game event
    pub fn dispatch(&mut self, event: GameEvent, now: GameTime) -> Result<UpdateResult> {
        let notifications = event::split(event, &self.config.routes)?;
        self.run(notifications, now, Outbox::new())
    }

    /// Route a single notification (host commands, scheduled deliveries)
    pub fn notify(&mut self, notification: Notification, now: GameTime) -> Result<UpdateResult> {
        self.run(vec![notification], now, Outbox::new())
    }

    /// Route notifications and their follow-ups until the queue drains
    ///
    /// Nothing is rolled back on failure. When a failure comes after any
    /// command was collected or notification routed, it is returned as
    /// [`Error::Dispatch`] carrying those effects.
    fn run(
        &mut self,
        notifications: Vec<Notification>,
        now: GameTime,
        mut out: Outbox,
    ) -> Result<UpdateResult> {
        let queue: VecDeque<Pending> = out
            .emitted
            .drain(..)
            .chain(notifications)
            .map(|notification| Pending {
                notification,
                chain: Vec::new(),
            })
            .collect();
        let mut fired = Vec::new();

        let drained = self.drain(queue, now, &mut out, &mut fired);
        let applied = UpdateResult {
            cmd: Cmd::batch(out.cmds),
            fired,
        };
        match drained {
            Ok(()) => Ok(applied),
            Err(cause) if applied.cmd.is_none() && applied.fired.is_empty() => Err(cause),
            Err(cause) => {
                tracing::warn!(error = %cause, fired = applied.fired.len(), "dispatch aborted after partial effects");
                Err(Error::Dispatch {
                    cause: Box::new(cause),
                    applied: Box::new(applied),
                })
            }
        }
    }

    fn drain(
        &mut self,
        mut queue: VecDeque<Pending>,
        now: GameTime,
        out: &mut Outbox,
        fired: &mut Vec<Notification>,
    ) -> Result<()> {
        while let Some(Pending {
            notification,
            mut chain,
        }) = queue.pop_front()
        {
            if !chain.is_empty() && !self.players.contains_key(&notification.player) {
                tracing::warn!(player = %notification.player, event = %notification.event, "follow-up for disconnected player dropped");
                continue;
            }
            self.route(&notification, now, out)?;
            chain.push((notification.player, notification.event.clone()));
            fired.push(notification);
            for next in out.emitted.drain(..) {
                if chain
                    .iter()
                    .any(|(player, event)| *player == next.player && *event == next.event)
                {
                    return Err(Error::ReentrantDispatch {
                        event: next.event,
                        player: next.player,
                    });
                }
                queue.push_back(Pending {
                    notification: next,
                    chain: chain.clone(),
                });
            }
        }
        Ok(())
    }

    /// Deliver one notification with its player detached from the roster
    fn route(&mut self, notification: &Notification, now: GameTime, out: &mut Outbox) -> Result<()> {
        let (index, id, mut player) = self
            .players
            .shift_remove_full(&notification.player)
            .ok_or(Error::UnknownPlayer(notification.player))?;
        let result = self.deliver(&mut player, notification, now, out);
        self.players.shift_insert(index, id, player);
        result
    }

    fn deliver(
        &mut self,
        player: &mut Player,
        notification: &Notification,
        now: GameTime,
        out: &mut Outbox,
    ) -> Result<()> {
        tracing::debug!(player = %player.id, event = %notification.event, "routing notification");
        self.react(Phase::BeforeAbilities, player, notification, now, out)?;
        routing::invoke_callbacks(
            player,
            &notification.event,
            &notification.args,
            Delivery {
                now,
                roster: Roster::new(&self.players),
                rng: &mut self.rng,
                out: &mut *out,
            },
        )?;
        self.react(Phase::AfterAbilities, player, notification, now, out)
    }

    fn react(
        &mut self,
        phase: Phase,
        player: &mut Player,
        notification: &Notification,
        now: GameTime,
        out: &mut Outbox,
    ) -> Result<()> {
        for reaction in self.reactions.iter_mut() {
            if reaction.phase() != phase || !reaction.handles(&notification.event) {
                continue;
            }
            let mut ctx = ReactionCtx {
                event: &notification.event,
                args: &notification.args,
                now,
                player: &mut *player,
                persistence: &mut *self.persistence,
                out: &mut *out,
            };
            reaction.react(&mut ctx).inspect_err(|e| {
                tracing::error!(reaction = reaction.name(), error = %e, "reaction failed");
            })?;
        }
        Ok(())
    }

    // ---- hero swap ----

    /// Skills for `key` with their stored levels restored
    fn prepared_skills(&mut self, player: &Player, key: &AbilityKey) -> Result<Vec<Skill>> {
        let hero = player
            .owned_hero(key)
            .ok_or_else(|| Error::HeroNotOwned(key.clone()))?;
        let mut skills = hero.new_skills();
        if let (Some(id), false) = (hero.record_id(), player.is_bot) {
            let records = self.persistence.load_skills(id)?;
            restore_skill_levels(&mut skills, records);
        }
        Ok(skills)
    }

    /// Switch the player's active hero
    ///
    /// Sequenced so a persistence failure leaves the player untouched: the
    /// incoming skills are loaded and the outgoing hero saved before anything
    /// in memory changes. The outgoing skills are discarded, the incoming
    /// hero's init callbacks run, then `player_change_hero` is fired.
    pub fn change_hero(
        &mut self,
        id: PlayerId,
        key: &AbilityKey,
        now: GameTime,
    ) -> Result<UpdateResult> {
        let ty = Arc::clone(self.registry.require(key)?);
        let (index, _, mut player) = self
            .players
            .shift_remove_full(&id)
            .ok_or(Error::UnknownPlayer(id))?;
        let result = self.swap_hero(&mut player, ty, now);
        self.players.shift_insert(index, id, player);
        let out = result?;
        self.run(Vec::new(), now, out)
    }

    fn swap_hero(
        &mut self,
        player: &mut Player,
        ty: Arc<HeroType>,
        now: GameTime,
    ) -> Result<Outbox> {
        let key = ty.def.key.clone();
        let old_key = player.active_key().cloned();
        if old_key.as_ref() == Some(&key) {
            return Ok(Outbox::new());
        }

        // Stage the incoming hero without touching the player.
        let mut new_hero = None;
        let incoming_skills = if player.owns(&key) {
            self.prepared_skills(player, &key)?
        } else {
            if !self
                .registry
                .selectable(player.total_level())
                .any(|unlocked| unlocked.def.key == key)
            {
                let required = ty.def.required_level;
                return Err(Error::HeroLocked { key, required });
            }
            let hero = Hero::new(ty, self.config.xp.curve());
            let skills = hero.new_skills();
            new_hero = Some(hero);
            skills
        };

        if !player.is_bot {
            let account = player.account.clone();
            if let Ok(old) = player.hero_mut() {
                self.persistence.save_hero(&account, old)?;
                self.persistence.save_skills(old)?;
            }
            match new_hero.as_mut() {
                Some(hero) => self
                    .persistence
                    .add_active_hero(&account, hero, &player.settings)?,
                None => {
                    let active = player.owned_hero(&key).and_then(Hero::record_id);
                    self.persistence
                        .save_player(&account, active, &player.settings)?
                }
            }
        }

        // Commit.
        if let Ok(old) = player.hero_mut() {
            old.take_skills();
        }
        if let Some(hero) = new_hero {
            player.insert_hero(hero);
        }
        player.set_active(&key)?;
        player.hero_mut()?.install_skills(incoming_skills);
        tracing::info!(player = %player.id, from = ?old_key.as_ref().map(AbilityKey::as_str), to = %key, "hero changed");

        let mut out = Outbox::new();
        routing::invoke_init(
            player,
            Delivery {
                now,
                roster: Roster::new(&self.players),
                rng: &mut self.rng,
                out: &mut out,
            },
        )?;

        let mut tokens = EventArgs::new();
        tokens.insert("hero".to_string(), Value::Ability(key.clone()));
        out.push(Cmd::say(player.id, "change_hero", tokens));
        out.push(Cmd::ShowMenu {
            player: player.id,
            menu: Menu::ViewSkills,
        });
        out.emitted.push(
            Notification::new(names::PLAYER_CHANGE_HERO, player.id)
                .with_arg("old_hero", old_key.map_or(Value::Null, Value::Ability))
                .with_arg("new_hero", key),
        );
        Ok(out)
    }

    // ---- skill commands ----

    /// Raise one skill of the active hero by a level
    pub fn upgrade_skill(
        &mut self,
        id: PlayerId,
        key: &AbilityKey,
        now: GameTime,
    ) -> Result<UpdateResult> {
        let hero = self.player_mut(id)?.hero_mut()?;
        let change = budget::upgrade(hero, key)?;
        self.skill_changed(id, key, names::SKILL_UPGRADE, "skill_upgraded", change, now)
    }

    /// Lower one skill of the active hero by a level
    pub fn downgrade_skill(
        &mut self,
        id: PlayerId,
        key: &AbilityKey,
        now: GameTime,
    ) -> Result<UpdateResult> {
        let hero = self.player_mut(id)?.hero_mut()?;
        let change = budget::downgrade(hero, key)?;
        self.skill_changed(id, key, names::SKILL_DOWNGRADE, "skill_downgraded", change, now)
    }

    fn skill_changed(
        &mut self,
        id: PlayerId,
        key: &AbilityKey,
        event: &str,
        message: &str,
        change: LevelChange,
        now: GameTime,
    ) -> Result<UpdateResult> {
        let mut out = Outbox::new();
        let mut tokens = EventArgs::new();
        tokens.insert("level".to_string(), change.new_level.into());
        out.push(Cmd::Say {
            player: id,
            source: Some(key.clone()),
            message: message.to_string(),
            tokens,
        });
        let notification = Notification::new(event, id)
            .with_arg("skill_key", key)
            .with_arg("old_level", change.old_level)
            .with_arg("new_level", change.new_level);
        self.run(vec![notification], now, out)
    }

    /// Set every skill of the active hero back to level 0
    pub fn reset_skills(&mut self, id: PlayerId) -> Result<UpdateResult> {
        let hero = self.player_mut(id)?.hero_mut()?;
        let reset = budget::reset_skills(hero);
        let points = budget::skill_points(hero);
        tracing::debug!(player = %id, skills = reset.len(), "skills reset");

        let mut tokens = EventArgs::new();
        tokens.insert("skill_points".to_string(), points.into());
        let cmd = Cmd::batch(vec![
            Cmd::say(id, "unspent_skill_points", tokens),
            Cmd::ShowMenu {
                player: id,
                menu: Menu::UpgradeSkills,
            },
        ]);
        Ok(UpdateResult {
            cmd,
            fired: Vec::new(),
        })
    }

    // ---- administrative ----

    /// Give (or with a negative amount, take) XP from the active hero
    pub fn grant_xp(&mut self, id: PlayerId, amount: i64, now: GameTime) -> Result<UpdateResult> {
        let hero = self.player_mut(id)?.hero_mut()?;
        let change = hero.add_xp(amount)?;
        self.level_changed(id, change, now)
    }

    /// Set the active hero's level directly
    pub fn set_hero_level(&mut self, id: PlayerId, level: u32, now: GameTime) -> Result<UpdateResult> {
        let hero = self.player_mut(id)?.hero_mut()?;
        let change = hero.set_level(level)?;
        self.level_changed(id, change, now)
    }

    fn level_changed(&mut self, id: PlayerId, change: LevelChange, now: GameTime) -> Result<UpdateResult> {
        match reaction::level_change_notification(id, change) {
            Some(notification) => {
                tracing::info!(player = %id, old = change.old_level, new = change.new_level, "hero level changed");
                self.run(vec![notification], now, Outbox::new())
            }
            None => Ok(UpdateResult::default()),
        }
    }

    // ---- queries ----

    pub fn skill_points(&self, id: PlayerId) -> Result<i64> {
        Ok(budget::skill_points(self.player(id)?.hero()?))
    }

    pub fn can_upgrade(&self, id: PlayerId, key: &AbilityKey) -> Result<bool> {
        Ok(budget::can_upgrade(self.player(id)?.hero()?, key))
    }

    pub fn can_downgrade(&self, id: PlayerId, key: &AbilityKey) -> Result<bool> {
        Ok(budget::can_downgrade(self.player(id)?.hero()?, key))
    }

    pub fn total_level(&self, id: PlayerId) -> Result<u32> {
        Ok(self.player(id)?.total_level())
    }

    pub fn hero_info(&self, id: PlayerId, language: &str) -> Result<HeroInfo> {
        Ok(HeroInfo::new(self.player(id)?.hero()?, language))
    }

    pub fn skill_menu(&self, id: PlayerId, language: &str) -> Result<Vec<SkillRow>> {
        Ok(display::skill_menu(self.player(id)?.hero()?, language))
    }

    pub fn hero_menu(&self, id: PlayerId, language: &str) -> Result<Vec<HeroRow>> {
        Ok(display::hero_menu(&self.registry, self.player(id)?, language))
    }

    /// Current value of a variable on the active hero or one of its skills
    pub fn current(&self, id: PlayerId, ability: &AbilityKey, name: &str) -> Result<f64> {
        let hero = self.player(id)?.hero()?;
        if hero.key() == ability {
            return hero.current(name);
        }
        hero.skill(ability)
            .ok_or(Error::Illegal(Illegal::NotOwned))?
            .current(name)
    }

    /// Display range of a variable on any hero or skill type
    pub fn range(&self, ability: &AbilityKey, name: &str) -> Result<VariableRange> {
        for hero in self.registry.iter() {
            if &hero.def.key == ability {
                return hero.def.range(name);
            }
            if let Some(skill) = hero.skill_type(ability) {
                return skill.def.range(name);
            }
        }
        Err(Error::UnknownHero(ability.clone()))
    }
}

fn restore_skill_levels(skills: &mut [Skill], records: Vec<SkillRecord>) {
    for record in records {
        let Some(skill) = skills.iter_mut().find(|s| s.key() == &record.key) else {
            tracing::warn!(skill = %record.key, "stored skill no longer exists, skipped");
            continue;
        };
        if skill.passive() {
            continue;
        }
        skill.set_record_id(record.id);
        if let Err(e) = skill.set_level(record.level) {
            tracing::warn!(skill = %record.key, level = record.level, error = %e, "stored skill level rejected");
        }
    }
}

fn hero_info_cmd(player: PlayerId, info: &HeroInfo) -> Cmd {
    let mut tokens = EventArgs::new();
    tokens.insert("name".to_string(), info.name.as_str().into());
    tokens.insert("level".to_string(), info.level.into());
    tokens.insert("xp".to_string(), Value::Int(i64::try_from(info.xp).unwrap_or(i64::MAX)));
    tokens.insert(
        "required_xp".to_string(),
        info.required_xp
            .map_or(Value::Null, |xp| Value::Int(i64::try_from(xp).unwrap_or(i64::MAX))),
    );
    Cmd::say(player, "hero_info", tokens)
}
