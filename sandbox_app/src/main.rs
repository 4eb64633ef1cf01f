//! Collision sandbox
//!
//! Runs a short scripted scene through the collision registry and logs every
//! transition. A ship sweeps across a field of rocks; bullets destroy the
//! first rock they touch.
//!
//! Usage: `collision_sandbox [config.toml|config.ron]`
//! Set `RUST_LOG=debug` to see registry bookkeeping.

use collide2d::foundation::logging;
use collide2d::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

const GROUP_SHIP: usize = 0;
const GROUP_ROCK: usize = 1;
const GROUP_BULLET: usize = 2;

const STEPS: usize = 240;
const DT: f32 = 1.0 / 60.0;

struct Sandbox {
    scene: SimpleListGraph,
    registry: CollisionRegistry,
    ship: Entity,
    bullets: Vec<Entity>,
    destroyed: Rc<RefCell<Vec<Entity>>>,
}

impl Sandbox {
    fn new(mut config: CollisionConfig) -> Self {
        // Bullets never hit the ship that fired them
        config.matrix.allow(GROUP_SHIP, GROUP_BULLET, false);
        config.matrix.allow(GROUP_BULLET, GROUP_BULLET, false);

        let mut scene = SimpleListGraph::new();
        let mut registry = CollisionRegistry::new(config);

        let ship = scene.spawn(Transform2D::from_position(Vec2::new(-20.0, 0.0)));
        scene.set_group(ship, Some(GROUP_SHIP));
        let hull = CollisionShape::polygon(vec![
            Point2::new(0.0, 1.5),
            Point2::new(1.0, -1.0),
            Point2::new(-1.0, -1.0),
        ]);
        registry.register(ship, hull);

        for (i, x) in [-10.0_f32, 0.0, 10.0].into_iter().enumerate() {
            let placement = Transform2D::from_position_rotation(Vec2::new(x, 0.5), 0.3 * i as f32);
            let rock = scene.spawn(placement);
            scene.set_group(rock, Some(GROUP_ROCK));
            let shape = if i % 2 == 0 {
                CollisionShape::circle(1.5)
            } else {
                CollisionShape::rect(2.5, 2.5)
            };
            registry.register(rock, shape);
        }

        log::info!(
            "Sandbox ready: {} shapes, {} contacts",
            registry.shape_count(),
            registry.contact_count()
        );

        let mut sandbox = Self {
            scene,
            registry,
            ship,
            bullets: Vec::new(),
            destroyed: Rc::default(),
        };
        sandbox.install_ship_callbacks();
        sandbox
    }

    fn install_ship_callbacks(&mut self) {
        self.registry.set_callback(self.ship, CollisionEventKind::Enter, |e: &CollisionEvent| {
            log::info!("Ship entered {:?}", e.other_owner);
        });
        self.registry.set_callback(self.ship, CollisionEventKind::Exit, |e: &CollisionEvent| {
            log::info!("Ship cleared {:?}", e.other_owner);
        });
    }

    fn fire(&mut self, from: Vec2) {
        let bullet = self.scene.spawn(Transform2D::from_position(from + Vec2::new(0.0, 2.0)));
        self.scene.set_group(bullet, Some(GROUP_BULLET));
        self.registry.register(bullet, CollisionShape::circle(0.25));

        let deferred = self.registry.deferred();
        let destroyed = Rc::clone(&self.destroyed);
        self.registry.set_callback(bullet, CollisionEventKind::Enter, move |e: &CollisionEvent| {
            log::info!("Bullet {:?} destroyed rock {:?}", e.this_owner, e.other_owner);
            deferred.unregister(e.this_owner);
            deferred.unregister(e.other_owner);
            destroyed.borrow_mut().extend([e.this_owner, e.other_owner]);
        });
        self.bullets.push(bullet);
    }

    fn update(&mut self, frame: usize) -> StepStats {
        let t = frame as f32 * DT;
        let ship_position = Vec2::new(-20.0 + 10.0 * t, 0.0);
        self.scene.set_transform(
            self.ship,
            Transform2D::from_position_rotation(ship_position, 0.1 * t),
        );

        if frame % 60 == 30 {
            self.fire(ship_position);
        }
        for bullet in &self.bullets {
            if let Some(node) = self.scene.node(*bullet) {
                let mut transform = node.transform;
                transform.position.y -= 20.0 * DT;
                self.scene.set_transform(*bullet, transform);
            }
        }

        // Hide whatever was destroyed; the registry purges it next step
        for entity in self.destroyed.borrow_mut().drain(..) {
            self.scene.set_active(entity, false);
        }

        self.registry.step(DT, &self.scene)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading collision config from {path}");
            let config = CollisionConfig::load_from_file(&path)?;
            config.validate()?;
            config
        }
        None => CollisionConfig::default(),
    };

    let mut sandbox = Sandbox::new(config);
    let mut totals = StepStats::default();
    for frame in 0..STEPS {
        let stats = sandbox.update(frame);
        totals.entered += stats.entered;
        totals.stayed += stats.stayed;
        totals.exited += stats.exited;
        totals.removed_shapes += stats.removed_shapes;
    }

    log::info!(
        "Finished {STEPS} steps: {} enters, {} stays, {} exits, {} shapes removed, {} shapes left",
        totals.entered,
        totals.stayed,
        totals.exited,
        totals.removed_shapes,
        sandbox.registry.shape_count()
    );
    Ok(())
}
