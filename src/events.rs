use bevy_ecs::prelude::Resource;
use std::fmt;

/// Application route, owned by the host. The crate never touches URLs; it
/// only reports where the host should navigate and reacts to route changes
/// the host pushes back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Shelf,
    Developer(String),
    Publisher(String),
    Game(String),
    Standalone(String),
}

#[derive(Debug, Clone)]
pub enum ShelfEvent {
    BoxActivated { id: i64, slug: String },
    BoxDeactivated { id: i64 },
    GatefoldToggled { id: i64, open: bool },
    NavigateTo { route: Route },
    CameraJump { x: f32, y: f32 },
}

impl fmt::Display for ShelfEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShelfEvent::BoxActivated { id, slug } => {
                write!(f, "BoxActivated id={id} slug={slug}")
            }
            ShelfEvent::BoxDeactivated { id } => write!(f, "BoxDeactivated id={id}"),
            ShelfEvent::GatefoldToggled { id, open } => {
                write!(f, "GatefoldToggled id={id} open={open}")
            }
            ShelfEvent::NavigateTo { route } => write!(f, "NavigateTo {route:?}"),
            ShelfEvent::CameraJump { x, y } => write!(f, "CameraJump x={x:.2} y={y:.2}"),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<ShelfEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: ShelfEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ShelfEvent> {
        self.events.drain(..).collect()
    }
}
