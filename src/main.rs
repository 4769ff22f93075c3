// src/main.rs
//! Headless demo: a few bodies dropped onto a static floor, a trigger zone and a
//! simple-space crate, ticked at 60 Hz while the camera drifts away.

use std::backtrace::Backtrace;
use std::fs::File;
use std::io::Write;
use std::panic;

use anyhow::Context;
use glam::Vec3;
use log::{info, LevelFilter};

use slop_physics::components::{Entity, PhysicalBody, PhysicalCollider};
use slop_physics::{shapes, Collider, PhysicalHooks, PhysicalObject, PhysicsConfig, Transform, World};

const FRAME: f32 = 1.0 / 60.0;

struct LogContacts;

impl PhysicalHooks for LogContacts {
    fn on_collide(&mut self, this: &PhysicalObject, other: &PhysicalObject) {
        log::debug!("{} touched {}", this.physic_id(), other.physic_id());
    }
}

fn main() -> anyhow::Result<()> {
    setup_diagnostics();

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => PhysicsConfig { gravity: Vec3::new(0.0, -9.81, 0.0), ..PhysicsConfig::default() },
    };
    info!("Starting slop_physics demo with {config:?}");

    let mut world = World::with_config(&config);

    let mut floor = world.engine_mut().create_object(Transform::from_position(Vec3::new(0.0, -1.0, 0.0)));
    floor.create_collider(shapes::cuboid(Vec3::new(50.0, 1.0, 50.0)), false)?;
    world.engine_mut().link_object("floor", floor)?;

    let mut entities = vec![
        Entity::new("ball", Transform::from_position(Vec3::new(0.0, 6.0, 0.0)))
            .with_component(PhysicalBody::rigid_body("ball", shapes::ball(0.5))),
        Entity::new("barrel", Transform::from_position(Vec3::new(0.3, 9.0, 0.0)))
            .with_component(PhysicalBody::rigid_body("barrel", shapes::cylinder(0.5, 0.4))),
        Entity::new("zone", Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .with_component(PhysicalBody::ghost("zone", shapes::cuboid(Vec3::splat(1.5)), true)),
        Entity::new("crate", Transform::from_position_scale(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE))
            .with_component(PhysicalCollider::new(
                "props",
                Collider::new("crate", slop_physics::ColliderModel::Aabb)
                    .with_rigid_body(true)
                    .with_gravity(Vec3::new(0.0, -0.5, 0.0)),
            )),
    ];
    for entity in &mut entities {
        entity.start(&mut world)?;
    }
    if let Some(ball) = world.engine_mut().object_mut("ball") {
        ball.set_hooks(LogContacts);
    }

    for frame in 0..240u32 {
        world.set_camera_position(Vec3::new(frame as f32, 0.0, 0.0));
        world.tick(FRAME);
        for entity in &mut entities {
            entity.update(&mut world);
        }

        for event in world.engine().collision_events() {
            if event.object == "zone" {
                info!("frame {frame}: '{}' is inside the zone", event.other);
            }
        }
        if frame % 60 == 0 {
            for entity in &entities {
                info!("frame {frame}: {} at {:?}", entity.name, entity.transform.position);
            }
        }
    }

    for entity in &mut entities {
        entity.destroy(&mut world);
    }
    world.tick(FRAME);
    world.engine_mut().clear();
    info!("Shutdown complete.");
    Ok(())
}

/// Debug builds log everything useful, release builds only warnings and errors.
fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Sets up logging and crash dumping.
fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(default_log_level())
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();

    panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();

        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };

        let location = panic_info
            .location()
            .map_or("Unknown location".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));

        let crash_msg = format!("=== PHYSICS CRASH ===\nReason: {msg}\nLocation: {location}\n\nStack Trace:\n{backtrace}");
        eprintln!("\x1b[31;1m{crash_msg}\x1b[0m");

        if let Ok(mut file) = File::create("physics_crash.log") {
            let _ = file.write_all(crash_msg.as_bytes());
            eprintln!("Crash report saved to physics_crash.log");
        }
    }));
}
