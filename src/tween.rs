use bevy_ecs::prelude::Entity;
use glam::Vec3;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Easing curves used by the shelf. `Out` and `InOut` are cubic; `BackOut`
/// overshoots slightly for the shelf-entry bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Out,
    InOut,
    BackOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Out => 1.0 - (1.0 - t).powi(3),
            Ease::InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::BackOut => {
                let c1 = 1.7;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
        }
    }
}

/// Independent animation channels per box entity. Posting to a channel that
/// is already animating replaces it, so the latest pose always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    Rotation,
    Gatefold,
    ModelOffset,
}

#[derive(Debug, Clone)]
struct ChannelTween {
    channel: Channel,
    from: Vec3,
    to: Vec3,
    duration: f32,
    delay: f32,
    elapsed: f32,
    ease: Ease,
}

impl ChannelTween {
    fn sample(&self) -> Vec3 {
        if self.elapsed < self.delay {
            return self.from;
        }
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = ((self.elapsed - self.delay) / self.duration).min(1.0);
        self.from.lerp(self.to, self.ease.apply(t))
    }

    fn finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

/// The state machines emit pose targets; this scheduler is the only place
/// interpolation happens. One entry per (entity, channel), stepped from the
/// host's frame tick.
#[derive(Default)]
pub struct TweenScheduler {
    active: HashMap<Entity, SmallVec<[ChannelTween; 4]>>,
}

impl TweenScheduler {
    pub fn post(
        &mut self,
        entity: Entity,
        channel: Channel,
        from: Vec3,
        to: Vec3,
        duration: f32,
        ease: Ease,
    ) {
        self.post_delayed(entity, channel, from, to, duration, 0.0, ease);
    }

    pub fn post_delayed(
        &mut self,
        entity: Entity,
        channel: Channel,
        from: Vec3,
        to: Vec3,
        duration: f32,
        delay: f32,
        ease: Ease,
    ) {
        let tween = ChannelTween {
            channel,
            from,
            to,
            duration: duration.max(0.0),
            delay: delay.max(0.0),
            elapsed: 0.0,
            ease,
        };
        let channels = self.active.entry(entity).or_default();
        if let Some(existing) = channels.iter_mut().find(|t| t.channel == channel) {
            *existing = tween;
        } else {
            channels.push(tween);
        }
    }

    /// Drop every pending animation for an entity; used on unmount so stale
    /// timers never fire into a despawned box.
    pub fn cancel_entity(&mut self, entity: Entity) {
        self.active.remove(&entity);
    }

    pub fn cancel_all(&mut self) {
        self.active.clear();
    }

    pub fn is_animating(&self, entity: Entity, channel: Channel) -> bool {
        self.active
            .get(&entity)
            .map(|channels| channels.iter().any(|t| t.channel == channel))
            .unwrap_or(false)
    }

    /// Advances all channels and hands each sampled value to `apply`.
    /// Finished channels deliver their exact target once, then drop.
    pub fn step(&mut self, dt: f32, mut apply: impl FnMut(Entity, Channel, Vec3)) {
        let dt = dt.max(0.0);
        self.active.retain(|entity, channels| {
            let mut index = 0;
            while index < channels.len() {
                let tween = &mut channels[index];
                tween.elapsed += dt;
                apply(*entity, tween.channel, tween.sample());
                if tween.finished() {
                    channels.swap_remove(index);
                } else {
                    index += 1;
                }
            }
            !channels.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    fn entity() -> Entity {
        World::new().spawn_empty().id()
    }

    #[test]
    fn ease_curves_hit_endpoints() {
        for ease in [Ease::Out, Ease::InOut, Ease::BackOut] {
            assert!((ease.apply(0.0)).abs() < 1e-6);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn back_out_overshoots_midway() {
        assert!(Ease::BackOut.apply(0.8) > 1.0);
    }

    #[test]
    fn tween_reaches_target_and_drops() {
        let e = entity();
        let mut scheduler = TweenScheduler::default();
        scheduler.post(e, Channel::Position, Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 0.15, Ease::Out);

        let mut last = Vec3::ZERO;
        scheduler.step(0.05, |_, _, v| last = v);
        assert!(last.y > 0.0 && last.y < 2.0);

        scheduler.step(0.2, |_, _, v| last = v);
        assert_eq!(last, Vec3::new(0.0, 2.0, 0.0));
        assert!(!scheduler.is_animating(e, Channel::Position));
    }

    #[test]
    fn posting_same_channel_replaces() {
        let e = entity();
        let mut scheduler = TweenScheduler::default();
        scheduler.post(e, Channel::Position, Vec3::ZERO, Vec3::X, 1.0, Ease::Out);
        scheduler.post(e, Channel::Position, Vec3::ZERO, Vec3::Y, 0.01, Ease::Out);

        let mut last = Vec3::ZERO;
        scheduler.step(0.5, |_, _, v| last = v);
        assert_eq!(last, Vec3::Y);
    }

    #[test]
    fn channels_animate_independently() {
        let e = entity();
        let mut scheduler = TweenScheduler::default();
        scheduler.post(e, Channel::Position, Vec3::ZERO, Vec3::X, 0.1, Ease::Out);
        scheduler.post(e, Channel::Gatefold, Vec3::ZERO, Vec3::Y, 10.0, Ease::InOut);

        scheduler.step(0.2, |_, _, _| {});
        assert!(!scheduler.is_animating(e, Channel::Position));
        assert!(scheduler.is_animating(e, Channel::Gatefold));
    }

    #[test]
    fn delay_holds_start_value() {
        let e = entity();
        let mut scheduler = TweenScheduler::default();
        scheduler.post_delayed(e, Channel::ModelOffset, Vec3::Z, Vec3::ZERO, 0.6, 0.3, Ease::BackOut);

        let mut last = Vec3::ONE;
        scheduler.step(0.1, |_, _, v| last = v);
        assert_eq!(last, Vec3::Z);
    }

    #[test]
    fn cancel_entity_drops_pending_timers() {
        let e = entity();
        let mut scheduler = TweenScheduler::default();
        scheduler.post_delayed(e, Channel::ModelOffset, Vec3::Z, Vec3::ZERO, 0.6, 0.3, Ease::BackOut);
        scheduler.cancel_entity(e);
        let mut fired = false;
        scheduler.step(5.0, |_, _, _| fired = true);
        assert!(!fired);
    }
}
