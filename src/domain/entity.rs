/// Entities: Player, Cheese, Platform.
///
/// Both moving entities share `Body`; only the collision shape differs.
/// Position is the top-left corner of the bounding box, so a circle of
/// radius `r` at `(x, y)` is centered on `(x + r, y + r)`.

use crate::config::{CheeseConfig, PlayerConfig, WorldConfig};
use super::geometry::Rect;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Shape {
    Rect { w: f32, h: f32 },
    Circle { r: f32 },
}

impl Shape {
    pub fn width(self) -> f32 {
        match self {
            Shape::Rect { w, .. } => w,
            Shape::Circle { r } => r * 2.0,
        }
    }

    pub fn height(self) -> f32 {
        match self {
            Shape::Rect { h, .. } => h,
            Shape::Circle { r } => r * 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub shape: Shape,
    pub grounded: bool,
}

impl Body {
    pub fn new(x: f32, y: f32, shape: Shape) -> Self {
        Body { x, y, vx: 0.0, vy: 0.0, shape, grounded: false }
    }

    pub fn width(&self) -> f32 {
        self.shape.width()
    }

    pub fn height(&self) -> f32 {
        self.shape.height()
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width() / 2.0, self.y + self.height() / 2.0)
    }

    /// Bounding box (a circle's is its enclosing square).
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width(), self.height())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Body,
    pub speed: f32,
    pub jump: f32,
}

impl Player {
    /// Standing on the ground line at the configured spawn column.
    pub fn spawn(cfg: &PlayerConfig, world: &WorldConfig) -> Self {
        let shape = Shape::Rect { w: cfg.width, h: cfg.height };
        Player {
            body: Body::new(cfg.spawn_x, world.ground_y() - cfg.height, shape),
            speed: cfg.speed,
            jump: cfg.jump,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cheese {
    pub body: Body,
}

impl Cheese {
    /// Resting on the ground line, already rolling at run speed.
    pub fn spawn(cfg: &CheeseConfig, world: &WorldConfig) -> Self {
        let mut body = Body::new(
            cfg.spawn_x,
            world.ground_y() - cfg.radius * 2.0,
            Shape::Circle { r: cfg.radius },
        );
        body.vx = cfg.run_speed;
        Cheese { body }
    }

    pub fn radius(&self) -> f32 {
        self.body.width() / 2.0
    }
}

/// Static platform. Only its top edge stops anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Platform {
    pub rect: Rect,
}

impl Platform {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Platform { rect: Rect::new(x, y, w, h) }
    }

    pub fn top(&self) -> f32 {
        self.rect.y
    }
}
