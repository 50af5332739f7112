//! Host adapter - Props to host operations.
//!
//! [`create`] builds a new object from host props; [`patch`] diffs two prop
//! sets and applies the difference as [`Mutation`]s. On mount every declared
//! property is applied and undeclared ones get their defaults, except for
//! direct objects, which only receive what the node declares.

use crate::error::SceneError;
use crate::host::{CreateSpec, HitArea, Mutation, Scene, TextStyle};
use crate::primitives::{
    BodyProps, CommonProps, ContainerProps, GroupProps, HostProps, PhysicsSpriteProps, ShapeProps,
    SpriteProps, TextProps,
};
use crate::types::{HostKind, ObjectId, PointerKind};

// =============================================================================
// Create
// =============================================================================

/// Create a host object and apply its initial props.
pub fn create(scene: &dyn Scene, props: &HostProps) -> Result<ObjectId, SceneError> {
    let object = scene.create(create_spec(props))?;
    log::debug!("created {} {}", props.kind(), object);
    patch(scene, object, props, None, true, false);
    Ok(object)
}

/// Constructor arguments for a host object.
pub fn create_spec(props: &HostProps) -> CreateSpec {
    let common = props.common();
    let x = common.x.unwrap_or(0.0);
    let y = common.y.unwrap_or(0.0);
    match props {
        HostProps::Container(_) => CreateSpec::Container { x, y },
        HostProps::Text(p) => CreateSpec::Text {
            x,
            y,
            text: p.text.clone().unwrap_or_default(),
            style: text_style(p),
        },
        HostProps::Graphics(_) => CreateSpec::Graphics,
        HostProps::Image(p) => CreateSpec::Image {
            x,
            y,
            texture: p.texture.clone(),
            frame: p.frame.clone(),
        },
        HostProps::Sprite(p) => CreateSpec::Sprite {
            x,
            y,
            texture: p.texture.clone(),
            frame: p.frame.clone(),
        },
        HostProps::PhysicsSprite(p) => CreateSpec::PhysicsSprite {
            x,
            y,
            texture: p.sprite.texture.clone(),
            frame: p.sprite.frame.clone(),
        },
        HostProps::PhysicsGroup(p) => CreateSpec::PhysicsGroup {
            config: p.config.clone(),
        },
    }
}

fn text_style(props: &TextProps) -> TextStyle {
    let defaults = TextStyle::default();
    TextStyle {
        font_size: props.font_size.unwrap_or(defaults.font_size),
        color: props.color.clone().unwrap_or(defaults.color),
        font_style: props.font_style.clone().unwrap_or(defaults.font_style),
    }
}

// =============================================================================
// Patch
// =============================================================================

/// Apply the difference between `previous` and `props` to a live object.
///
/// `previous = None` diffs against empty props. `is_mount` forces every
/// declared property through; `is_direct` suppresses mount defaults.
pub fn patch(
    scene: &dyn Scene,
    object: ObjectId,
    props: &HostProps,
    previous: Option<&HostProps>,
    is_mount: bool,
    is_direct: bool,
) {
    let blank;
    let previous = match previous {
        Some(previous) => previous,
        None => {
            blank = blank_like(props);
            &blank
        }
    };

    // Direct objects are patched as whatever they really are.
    let kind = if is_direct {
        scene.kind_of(object)
    } else {
        Some(props.kind())
    };
    let Some(kind) = kind else {
        return;
    };

    let patcher = Patcher {
        scene,
        object,
        kind,
        is_mount,
        defaults: is_mount && !is_direct,
    };

    patcher.common(props.common(), previous.common());

    if !kind.satisfies(props.kind()) {
        patcher.data(props.common(), previous.common());
        return;
    }

    match (props, previous) {
        (HostProps::Text(new), HostProps::Text(old)) => patcher.text(new, old),
        (HostProps::Graphics(new), HostProps::Graphics(old)) => patcher.graphics(new, old),
        (HostProps::Image(new), HostProps::Image(old))
        | (HostProps::Sprite(new), HostProps::Sprite(old)) => patcher.sprite(new, old),
        (HostProps::PhysicsSprite(new), HostProps::PhysicsSprite(old)) => {
            patcher.sprite(&new.sprite, &old.sprite);
            patcher.body(&new.body, &old.body, &new.sprite.common, &old.sprite.common);
        }
        _ => {}
    }

    patcher.data(props.common(), previous.common());
}

/// Empty props of the same kind.
fn blank_like(props: &HostProps) -> HostProps {
    match props {
        HostProps::Container(_) => HostProps::Container(ContainerProps::default()),
        HostProps::Text(_) => HostProps::Text(TextProps::default()),
        HostProps::Graphics(_) => HostProps::Graphics(ShapeProps::default()),
        HostProps::Image(_) => HostProps::Image(SpriteProps::default()),
        HostProps::Sprite(_) => HostProps::Sprite(SpriteProps::default()),
        HostProps::PhysicsSprite(_) => HostProps::PhysicsSprite(PhysicsSpriteProps::default()),
        HostProps::PhysicsGroup(_) => HostProps::PhysicsGroup(GroupProps::default()),
    }
}

struct Patcher<'a> {
    scene: &'a dyn Scene,
    object: ObjectId,
    kind: HostKind,
    is_mount: bool,
    /// Mount of a reconciler-created object: undeclared props get defaults.
    defaults: bool,
}

impl Patcher<'_> {
    fn emit(&self, mutation: Mutation) {
        self.scene.apply(self.object, mutation);
    }

    /// Declared value on change (or on mount), else the default on a defaulting mount.
    fn value<T: PartialEq + Copy>(&self, new: Option<T>, old: Option<T>, default: T) -> Option<T> {
        if !self.is_mount && new == old {
            return None;
        }
        match new {
            Some(v) => Some(v),
            None if self.defaults => Some(default),
            None => None,
        }
    }

    // =========================================================================
    // Shared surface
    // =========================================================================

    fn common(&self, new: &CommonProps, old: &CommonProps) {
        // Groups are not display objects.
        if self.kind != HostKind::PhysicsGroup {
            self.transform(new, old);
        }
        self.input(new, old);
    }

    fn transform(&self, new: &CommonProps, old: &CommonProps) {
        if let Some(x) = self.value(new.x, old.x, 0.0) {
            self.emit(Mutation::X(x));
        }
        if let Some(y) = self.value(new.y, old.y, 0.0) {
            self.emit(Mutation::Y(y));
        }
        if let Some(alpha) = self.value(new.alpha, old.alpha, 1.0) {
            self.emit(Mutation::Alpha(alpha));
        }
        if let Some(visible) = self.value(new.visible, old.visible, true) {
            self.emit(Mutation::Visible(visible));
        }
        if let Some(scale) = self.value(new.scale, old.scale, 1.0) {
            self.emit(Mutation::Scale(scale));
        }

        let has_origin = matches!(
            self.kind,
            HostKind::Text | HostKind::Image | HostKind::Sprite | HostKind::PhysicsSprite
        );
        if has_origin
            && (self.is_mount || new.origin_x != old.origin_x || new.origin_y != old.origin_y)
        {
            match new.origin_x {
                Some(ox) => self.emit(Mutation::Origin(ox, new.origin_y.unwrap_or(ox))),
                None if self.defaults => self.emit(Mutation::Origin(0.5, 0.5)),
                None => {}
            }
        }

        if let Some(rotation) = self.value(new.rotation, old.rotation, 0.0) {
            self.emit(Mutation::Rotation(rotation));
        }

        // Size goes before interactivity so bounds hit areas see it.
        if new.width != old.width || new.height != old.height {
            if let (Some(w), Some(h)) = (new.width, new.height) {
                self.emit(Mutation::Size(w, h));
            }
        }
    }

    fn input(&self, new: &CommonProps, old: &CommonProps) {
        let resized = new.width != old.width || new.height != old.height;
        let enabled = new.interactive == Some(true);
        if new.interactive != old.interactive || (enabled && resized) {
            if enabled {
                let area = match (self.kind, new.width, new.height) {
                    (HostKind::Graphics, Some(width), Some(height)) => HitArea::Rect { width, height },
                    _ => HitArea::Bounds {
                        hand_cursor: new.use_hand_cursor.unwrap_or(new.on_click.is_some()),
                    },
                };
                self.emit(Mutation::Interactive(area));
            } else {
                self.emit(Mutation::DisableInteractive);
            }
        }

        let handlers = [
            (PointerKind::Down, &new.on_click, &old.on_click),
            (PointerKind::Over, &new.on_pointer_over, &old.on_pointer_over),
            (PointerKind::Out, &new.on_pointer_out, &old.on_pointer_out),
        ];
        for (kind, new, old) in handlers {
            if new == old {
                continue;
            }
            if let Some(old) = old {
                self.emit(Mutation::Unlisten(kind, old.clone()));
            }
            if let Some(new) = new {
                self.emit(Mutation::Listen(kind, new.clone()));
            }
        }
    }

    fn data(&self, new: &CommonProps, old: &CommonProps) {
        for (key, value) in &new.data {
            if !self.is_mount && old.data.get(key) == Some(value) {
                continue;
            }
            if self.scene.has_field(self.object, key) {
                self.emit(Mutation::Field(key.clone(), value.clone()));
            }
            self.emit(Mutation::Data(key.clone(), value.clone()));
        }
    }

    // =========================================================================
    // Kind surfaces
    // =========================================================================

    fn text(&self, new: &TextProps, old: &TextProps) {
        if new.text != old.text {
            self.emit(Mutation::Text(new.text.clone().unwrap_or_default()));
        }
        // Created objects already carry their style.
        let restyled = new.font_size != old.font_size
            || new.color != old.color
            || new.font_style != old.font_style;
        if restyled && !self.defaults {
            self.emit(Mutation::TextStyle(text_style(new)));
        }
    }

    fn graphics(&self, new: &ShapeProps, old: &ShapeProps) {
        let (n, o) = (&new.common, &old.common);
        let changed = n.width != o.width
            || n.height != o.height
            || n.alpha != o.alpha
            || new.fill != old.fill
            || new.stroke_width != old.stroke_width
            || new.line_color != old.line_color;
        if !changed {
            return;
        }

        let width = n.width.unwrap_or(0.0);
        let height = n.height.unwrap_or(0.0);
        self.emit(Mutation::ClearGraphics);
        if let Some(color) = new.fill {
            self.emit(Mutation::FillStyle { color, alpha: n.alpha.unwrap_or(1.0) });
            self.emit(Mutation::FillRect { x: 0.0, y: 0.0, width, height });
        }
        if let (Some(stroke), Some(color)) = (new.stroke_width, new.line_color) {
            if stroke != 0.0 {
                self.emit(Mutation::LineStyle { width: stroke, color, alpha: 1.0 });
                self.emit(Mutation::StrokeRect { x: 0.0, y: 0.0, width, height });
            }
        }
    }

    fn sprite(&self, new: &SpriteProps, old: &SpriteProps) {
        let force = self.defaults;
        if force || new.texture != old.texture || new.frame != old.frame {
            if let Some(key) = &new.texture {
                self.emit(Mutation::Texture {
                    key: key.clone(),
                    frame: new.frame.clone(),
                });
            }
        }
        if force || new.tint != old.tint {
            match new.tint {
                Some(tint) => self.emit(Mutation::Tint(tint)),
                None => self.emit(Mutation::ClearTint),
            }
        }
        if force || new.flip_x != old.flip_x {
            self.emit(Mutation::FlipX(new.flip_x.unwrap_or(false)));
        }
        if force || new.flip_y != old.flip_y {
            self.emit(Mutation::FlipY(new.flip_y.unwrap_or(false)));
        }
        // Images have no animation component.
        if self.kind != HostKind::Image && (force || new.play != old.play) {
            match &new.play {
                Some(animation) => self.emit(Mutation::Play {
                    animation: animation.clone(),
                    ignore_if_playing: true,
                }),
                None if !self.is_mount => self.emit(Mutation::StopAnimation),
                None => {}
            }
        }
    }

    fn body(&self, new: &BodyProps, old: &BodyProps, common: &CommonProps, old_common: &CommonProps) {
        let force = self.defaults;
        if force || new.velocity_x != old.velocity_x {
            self.emit(Mutation::VelocityX(new.velocity_x.unwrap_or(0.0)));
        }
        if force || new.velocity_y != old.velocity_y {
            self.emit(Mutation::VelocityY(new.velocity_y.unwrap_or(0.0)));
        }
        if force || new.collide_world_bounds != old.collide_world_bounds {
            self.emit(Mutation::CollideWorldBounds(new.collide_world_bounds.unwrap_or(false)));
        }
        if force || new.bounce != old.bounce {
            self.emit(Mutation::Bounce(new.bounce.unwrap_or(0.0)));
        }
        if force || new.drag != old.drag {
            self.emit(Mutation::Drag(new.drag.unwrap_or(0.0)));
        }
        if force || new.gravity_y != old.gravity_y {
            self.emit(Mutation::GravityY(new.gravity_y.unwrap_or(0.0)));
        }
        if force || new.immovable != old.immovable {
            self.emit(Mutation::Immovable(new.immovable.unwrap_or(false)));
        }

        let ratio_changed = common.scale != old_common.scale
            || new.body_width_ratio != old.body_width_ratio
            || new.body_height_ratio != old.body_height_ratio;
        if force || ratio_changed {
            if let (Some(wr), Some(hr)) = (new.body_width_ratio, new.body_height_ratio) {
                let metrics = self.scene.metrics(self.object);
                let scale = common.scale.unwrap_or(metrics.scale_x);
                self.emit(Mutation::BodySize {
                    width: metrics.width * scale * wr,
                    height: metrics.height * scale * hr,
                    center: true,
                });

                // Centering assumes a 0.5 origin; compensate for anything else.
                let origin_x = common.origin_x.unwrap_or(metrics.origin_x);
                let origin_y = common.origin_y.unwrap_or(metrics.origin_y);
                if origin_x != 0.5 || origin_y != 0.5 {
                    self.emit(Mutation::BodyOffset {
                        x: (0.5 - origin_x) * metrics.display_width,
                        y: (0.5 - origin_y) * metrics.display_height,
                    });
                }
            }
        }

        if force || new.body_width != old.body_width || new.body_height != old.body_height {
            if let (Some(width), Some(height)) = (new.body_width, new.body_height) {
                self.emit(Mutation::BodySize { width, height, center: true });
            }
        }

        if force || new.body_offset_x != old.body_offset_x || new.body_offset_y != old.body_offset_y {
            if new.body_offset_x.is_some() || new.body_offset_y.is_some() {
                self.emit(Mutation::BodyOffset {
                    x: new.body_offset_x.unwrap_or(0.0),
                    y: new.body_offset_y.unwrap_or(0.0),
                });
            }
        }
    }
}
