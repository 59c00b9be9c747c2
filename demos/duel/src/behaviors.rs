//! Callbacks for the demo heroes
//!
//! Every world effect is a `Cmd::Apply` the host would carry out; the demo
//! host just prints them.

use herowars_core::event::{ATTACKER, VICTIM};
use herowars_core::{skill_callback, Callbacks, EventArgs, Result, SkillCallback, SkillCtx, Value};
use herowars_script::{BehaviorCatalog, HeroBehavior};
use herowars_core::time::secs_to_duration;

fn args<const N: usize>(pairs: [(&str, Value); N]) -> EventArgs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Behaviors for every hero directory under `heroes/`
pub fn catalog() -> BehaviorCatalog {
    BehaviorCatalog::new()
        .with("paladin", paladin())
        .with("assassin", assassin())
}

fn paladin() -> HeroBehavior {
    let condemn = skill_callback(|ctx| {
        let Some(victim) = ctx.arg_player(VICTIM) else {
            return Ok(());
        };
        let chance = ctx.current("chance")?;
        if ctx.chance(chance) {
            let duration = ctx.current("duration")?;
            ctx.apply(victim, "freeze", args([("duration", duration.into())]));
            ctx.say_string_to(victim, "victim_message", args([("duration", duration.into())]));
        }
        Ok(())
    });

    let saints_cloak = skill_callback(|ctx| {
        let player = ctx.player;
        let health = ctx.current("health")?;
        let alpha = 255.0 * (1.0 - ctx.current("invis")? / 100.0);
        ctx.apply(player, "add_max_health", args([("amount", health.into())]));
        ctx.apply(player, "set_alpha", args([("alpha", alpha.round().into())]));
        Ok(())
    });

    let martyr = skill_callback(|ctx| {
        let Some(killer) = ctx.arg_player(ATTACKER) else {
            return Ok(());
        };
        let player = ctx.player;
        let damage = ctx.current("damage")?;
        let heal = ctx.current("heal")?;
        ctx.apply(player, "heal_team", args([("amount", heal.into())]));
        ctx.apply(
            killer,
            "damage",
            args([("amount", damage.into()), ("attacker", player.into())]),
        );
        let killer_name = ctx
            .roster
            .get(killer)
            .map(|p| p.account.clone())
            .unwrap_or_default();
        ctx.say_string(
            "user_message",
            args([("damage", damage.into()), ("name", killer_name.into())]),
        );
        ctx.say_string_to(killer, "killer_message", args([("damage", damage.into())]));
        Ok(())
    });

    let god_mode = skill_callback(|ctx| {
        if !ctx.cooldown("cooldown")?.is_zero() {
            return Ok(());
        }
        let player = ctx.player;
        let duration = ctx.current("duration")?;
        ctx.apply(player, "godmode", args([("duration", duration.into())]));
        ctx.apply(player, "set_color", args([("color", "yellow".into())]));
        ctx.say_string("start_message", args([("duration", duration.into())]));
        ctx.schedule(
            "god_mode_end",
            secs_to_duration(duration),
            EventArgs::new(),
        );
        Ok(())
    });
    let god_mode_end = skill_callback(|ctx| {
        let player = ctx.player;
        ctx.apply(player, "reset_color", EventArgs::new());
        ctx.say_string("end_message", EventArgs::new());
        Ok(())
    });

    HeroBehavior::new()
        .skill("condemn", Callbacks::new().on("player_attack", condemn))
        .skill("saints_cloak", Callbacks::new().on("player_spawn", saints_cloak))
        .skill("martyr", Callbacks::new().on("player_death", martyr))
        .skill(
            "god_mode",
            Callbacks::new()
                .on("player_ultimate", god_mode)
                .on("god_mode_end", god_mode_end),
        )
}

fn assassin() -> HeroBehavior {
    let traditional_tools = skill_callback(|ctx| {
        let player = ctx.player;
        let allowed = Value::from(vec!["weapon_knife", "weapon_c4"]);
        ctx.apply(player, "restrict_weapons", args([("allowed", allowed)]));
        Ok(())
    });

    let sharp_blade = skill_callback(|ctx| {
        let Some(victim) = ctx.arg_player(VICTIM) else {
            return Ok(());
        };
        let multiplier = 1.0 + ctx.current("damage")? / 100.0;
        ctx.apply(victim, "scale_damage", args([("multiplier", multiplier.into())]));
        Ok(())
    });

    let leap_spawn = skill_callback(|ctx| {
        let longjump = ctx.current("longjump")?;
        ctx.say_string("spawn_message", args([("longjump", longjump.into())]));
        Ok(())
    });
    let leap_jump = skill_callback(|ctx| {
        let player = ctx.player;
        let boost = 1.0 + ctx.current("longjump")? / 100.0;
        ctx.apply(
            player,
            "boost_velocity",
            args([("factor", boost.into()), ("cap", 1000.0.into())]),
        );
        Ok(())
    });

    let meditate: SkillCallback = skill_callback(|ctx| {
        let player = ctx.player;
        let heal = ctx.current("heal")?;
        let interval = ctx.current("interval")?;
        ctx.skill.state.insert("healing".to_string(), true.into());
        ctx.apply(
            player,
            "regenerate",
            args([("amount", heal.into()), ("interval", interval.into())]),
        );
        Ok(())
    });
    let meditation_init = skill_callback(|ctx| {
        ctx.skill.state.insert("healing".to_string(), false.into());
        Ok(())
    });
    let meditation_restart = skill_callback(|ctx| {
        let healing = ctx
            .skill
            .state
            .get("healing")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let is_self = ctx
            .arg("skill_key")
            .and_then(Value::as_ability)
            .is_some_and(|key| key == ctx.skill.key());
        if healing && is_self {
            let player = ctx.player;
            let interval = ctx.current("interval")?;
            ctx.apply(player, "regenerate", args([("interval", interval.into())]));
        }
        Ok(())
    });

    let total_vanish = skill_callback(|ctx| {
        if vanished(ctx.skill.state.get("vanished")) {
            return reveal(ctx);
        }
        if !ctx.cooldown("cooldown")?.is_zero() {
            return Ok(());
        }
        let player = ctx.player;
        let duration = ctx.current("duration")?;
        ctx.skill.state.insert("vanished".to_string(), true.into());
        ctx.apply(player, "set_alpha", args([("alpha", 0.into())]));
        ctx.apply(player, "paralyze", EventArgs::new());
        ctx.apply(player, "strip_weapons", EventArgs::new());
        ctx.schedule(
            "total_vanish_end",
            secs_to_duration(duration),
            EventArgs::new(),
        );
        Ok(())
    });
    let total_vanish_end = skill_callback(|ctx| {
        if vanished(ctx.skill.state.get("vanished")) {
            reveal(ctx)?;
        }
        Ok(())
    });

    HeroBehavior::new()
        .skill(
            "traditional_tools",
            Callbacks::new().on("player_spawn", traditional_tools),
        )
        .skill("sharp_blade", Callbacks::new().on("pre_player_attack", sharp_blade))
        .skill(
            "leap",
            Callbacks::new()
                .on("player_spawn", leap_spawn)
                .on("player_jump", leap_jump),
        )
        .skill(
            "meditation",
            Callbacks::new()
                .on_init(meditation_init)
                .on("player_victim", meditate)
                .on("skill_upgrade", meditation_restart.clone())
                .on("skill_downgrade", meditation_restart),
        )
        .skill(
            "total_vanish",
            Callbacks::new()
                .on("player_ultimate", total_vanish)
                .on("total_vanish_end", total_vanish_end),
        )
}

fn vanished(state: Option<&Value>) -> bool {
    state.and_then(Value::as_bool).unwrap_or(false)
}

fn reveal(ctx: &mut SkillCtx<'_>) -> Result<()> {
    let player = ctx.player;
    ctx.skill.state.insert("vanished".to_string(), false.into());
    ctx.apply(player, "set_alpha", args([("alpha", 255.into())]));
    ctx.apply(player, "unparalyze", EventArgs::new());
    ctx.apply(
        player,
        "give_item",
        args([("item", "weapon_knife".into())]),
    );
    Ok(())
}
