use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use crate::mesh::{self, Mesh};

const DEFAULT_ROOM: &str = include_str!("../assets/room.xml");
const DEFAULT_SEGMENTS: u32 = 32;

/// Static room content: furniture, lights and tuning overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub background: Vec3,
    pub tuning: ViewerConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            background: Vec3::splat(17.0 / 255.0),
            tuning: ViewerConfig::default(),
        }
    }
}

impl Scene {
    /// The furnished room shipped with the viewer.
    pub fn default_room() -> Result<Self> {
        Self::from_xml(DEFAULT_ROOM).context("built-in room is invalid")
    }

    /// Parses a `<room>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid room XML")?;
        let root = document.root_element();
        let mut scene = Scene {
            background: parse_color(optional_text(&root, "background"), Scene::default().background)?,
            ..Scene::default()
        };

        collect_objects(&root, Mat4::IDENTITY, &mut scene.objects)?;

        for node in root.children().filter(|n| n.has_tag_name("light")) {
            scene.lights.push(parse_light(&node)?);
        }

        if let Some(tuning) = root.children().find(|n| n.has_tag_name("tuning")) {
            apply_tuning(&tuning, &mut scene.tuning)?;
        }

        Ok(scene)
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn light(&self, kind: LightKind) -> Option<&Light> {
        self.lights.iter().find(|light| light.kind == kind)
    }
}

/// Primitive used to build a furniture part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Box {
        size: Vec3,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
        capped: bool,
    },
    Cone {
        radius: f32,
        height: f32,
        segments: u32,
        capped: bool,
    },
    Disc {
        radius: f32,
        segments: u32,
    },
    Icosahedron {
        radius: f32,
    },
}

impl Shape {
    pub fn mesh(&self) -> Mesh {
        match *self {
            Shape::Box { size } => mesh::cuboid(size),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                segments,
                capped,
            } => mesh::cylinder(radius_top, radius_bottom, height, segments, capped),
            Shape::Cone {
                radius,
                height,
                segments,
                capped,
            } => mesh::cone(radius, height, segments, capped),
            Shape::Disc { radius, segments } => mesh::disc(radius, segments),
            Shape::Icosahedron { radius } => mesh::icosahedron(radius),
        }
    }

    /// Identical shapes share one GPU mesh.
    pub fn cache_key(&self) -> String {
        format!("{self:?}")
    }
}

/// A furniture part placed in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub shape: Shape,
    pub color: Vec3,
    pub opacity: f32,
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Transform of the enclosing `<group>` elements.
    #[serde(default)]
    pub parent: Mat4,
}

impl SceneObject {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * euler_degrees(self.rotation) * Mat4::from_scale(self.scale)
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.parent * self.local_matrix()
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix().transform_point3(Vec3::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Ambient,
    Point,
    Directional,
}

/// Light source. Directional lights shine from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    /// Point light cutoff distance; zero means unlimited.
    pub range: f32,
}

fn euler_degrees(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_x(rotation.x.to_radians())
        * Mat4::from_rotation_y(rotation.y.to_radians())
        * Mat4::from_rotation_z(rotation.z.to_radians())
}

fn node_transform(node: &Node<'_, '_>) -> Result<Mat4> {
    let position = parse_vec3(optional_text(node, "position"), Vec3::ZERO)?;
    let rotation = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?;
    let scale = parse_vec3(optional_text(node, "scale"), Vec3::ONE)?;
    Ok(Mat4::from_translation(position) * euler_degrees(rotation) * Mat4::from_scale(scale))
}

fn collect_objects(node: &Node<'_, '_>, parent: Mat4, objects: &mut Vec<SceneObject>) -> Result<()> {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "object" => objects.push(parse_object(&child, parent)?),
            "group" => {
                let transform = parent * node_transform(&child)?;
                collect_objects(&child, transform, objects)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_object(node: &Node<'_, '_>, parent: Mat4) -> Result<SceneObject> {
    let name = required_text(node, "name")?;
    let shape = parse_shape(node).with_context(|| format!("object {name}"))?;
    Ok(SceneObject {
        shape,
        color: parse_color(optional_text(node, "color"), Vec3::ONE)?,
        opacity: parse_f32(optional_text(node, "opacity"), 1.0)?.clamp(0.0, 1.0),
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        rotation: parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?,
        scale: parse_vec3(optional_text(node, "scale"), Vec3::ONE)?,
        parent,
        name,
    })
}

fn parse_shape(node: &Node<'_, '_>) -> Result<Shape> {
    let kind = required_text(node, "shape")?;
    let size = parse_numbers(optional_text(node, "size").as_deref().unwrap_or_default())?;
    let capped = optional_text(node, "capped").map_or(true, |value| value != "false");
    let arg = |index: usize| -> Result<f32> {
        size.get(index)
            .copied()
            .ok_or_else(|| anyhow!("{kind} <size> needs at least {} values", index + 1))
    };
    let segments = |index: usize| size.get(index).map_or(DEFAULT_SEGMENTS, |s| *s as u32);
    let shape = match kind.as_str() {
        "box" => Shape::Box {
            size: Vec3::new(arg(0)?, arg(1)?, arg(2)?),
        },
        "cylinder" => Shape::Cylinder {
            radius_top: arg(0)?,
            radius_bottom: arg(1)?,
            height: arg(2)?,
            segments: segments(3),
            capped,
        },
        "cone" => Shape::Cone {
            radius: arg(0)?,
            height: arg(1)?,
            segments: segments(2),
            capped,
        },
        "disc" => Shape::Disc {
            radius: arg(0)?,
            segments: segments(1),
        },
        "icosahedron" => Shape::Icosahedron { radius: arg(0)? },
        other => bail!("unknown shape {other}"),
    };
    Ok(shape)
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let kind = match required_text(node, "kind")?.as_str() {
        "ambient" => LightKind::Ambient,
        "point" => LightKind::Point,
        "directional" => LightKind::Directional,
        other => bail!("unknown light kind {other}"),
    };
    Ok(Light {
        kind,
        color: parse_color(optional_text(node, "color"), Vec3::ONE)?,
        intensity: parse_f32(optional_text(node, "intensity"), 1.0)?,
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        range: parse_f32(optional_text(node, "range"), 0.0)?,
    })
}

fn apply_tuning(node: &Node<'_, '_>, config: &mut ViewerConfig) -> Result<()> {
    let text = |tag| optional_text(node, tag);
    config.walk_speed = parse_f32(text("walk_speed"), config.walk_speed)?;
    config.turn_speed = parse_f32(text("turn_speed"), config.turn_speed)?;
    config.weight_smoothing = parse_f32(text("weight_smoothing"), config.weight_smoothing)?;
    config.camera_smoothing = parse_f32(text("camera_smoothing"), config.camera_smoothing)?;
    for (tag, value) in [
        ("weight_smoothing", config.weight_smoothing),
        ("camera_smoothing", config.camera_smoothing),
    ] {
        if !(0.0..=1.0).contains(&value) {
            bail!("<{tag}> must be within [0, 1], got {value}");
        }
    }
    config.camera_offset = parse_vec3(text("camera_offset"), config.camera_offset)?;
    config.target_offset = parse_vec3(text("target_offset"), config.target_offset)?;
    config.console_distance = parse_f32(text("console_distance"), config.console_distance)?;
    config.console_capacity =
        parse_f32(text("console_capacity"), config.console_capacity as f32)?.max(1.0) as usize;
    config.joystick_radius = parse_f32(text("joystick_radius"), config.joystick_radius)?;
    config.joystick_deadzone = parse_f32(text("joystick_deadzone"), config.joystick_deadzone)?;
    config.gamepad_deadzone = parse_f32(text("gamepad_deadzone"), config.gamepad_deadzone)?;
    config.fov = parse_f32(text("fov"), config.fov)?;
    Ok(())
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_numbers(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid number {component:?}: {err}"))
        })
        .collect()
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_numbers(&value)?.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector {value:?} needs three components")),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    parse_vec3(Some(value), default).map(|rgb| rgb / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <room>
        <light>
            <kind>point</kind>
            <intensity>10</intensity>
            <range>10</range>
            <position>1.2 1.5 -1.2</position>
            <color>255 170 85</color>
        </light>
        <group>
            <position>1 0 0</position>
            <rotation>0 90 0</rotation>
            <object>
                <name>Leg</name>
                <shape>cylinder</shape>
                <size>0.04 0.02 0.3</size>
                <position>0 0 1</position>
            </object>
        </group>
        <tuning>
            <walk_speed>3.5</walk_speed>
        </tuning>
    </room>
    "#;

    #[test]
    fn parses_objects_lights_and_tuning() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 1);
        let light = scene.light(LightKind::Point).unwrap();
        assert_eq!(light.position, Vec3::new(1.2, 1.5, -1.2));
        assert_eq!(light.color, Vec3::new(1.0, 170.0 / 255.0, 85.0 / 255.0));
        assert_eq!(scene.tuning.walk_speed, 3.5);
        assert_eq!(scene.tuning.turn_speed, 2.0);

        let leg = scene.object("Leg").unwrap();
        assert_eq!(
            leg.shape,
            Shape::Cylinder {
                radius_top: 0.04,
                radius_bottom: 0.02,
                height: 0.3,
                segments: 32,
                capped: true,
            }
        );
    }

    #[test]
    fn groups_transform_their_children() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let leg = scene.object("Leg").unwrap();
        // +Z turned 90 degrees about Y points along +X
        assert!((leg.world_position() - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn default_room_is_furnished() {
        let scene = Scene::default_room().unwrap();
        for name in ["Rug", "Seat", "Back", "TableTop", "Plant", "LampShade"] {
            assert!(scene.object(name).is_some(), "missing {name}");
        }
        assert_eq!(scene.lights.len(), 3);
        let shade = scene.object("LampShade").unwrap();
        assert!(matches!(shade.shape, Shape::Cone { capped: false, .. }));
        assert!((shade.world_position() - Vec3::new(1.2, 1.5, -1.2)).length() < 1e-5);
    }

    #[test]
    fn rejects_bad_objects() {
        let missing_name = "<room><object><shape>box</shape><size>1 1 1</size></object></room>";
        assert!(Scene::from_xml(missing_name).is_err());
        let short_size = "<room><object><name>A</name><shape>box</shape><size>1 1</size></object></room>";
        assert!(Scene::from_xml(short_size).is_err());
        let unknown = "<room><object><name>A</name><shape>torus</shape></object></room>";
        assert!(Scene::from_xml(unknown).is_err());
    }

    #[test]
    fn smoothing_factors_must_be_fractions() {
        let room =
            |tag: &str, value: &str| format!("<room><tuning><{tag}>{value}</{tag}></tuning></room>");

        let err = Scene::from_xml(&room("weight_smoothing", "1.5")).unwrap_err();
        assert!(format!("{err:#}").contains("<weight_smoothing> must be within [0, 1]"));
        assert!(Scene::from_xml(&room("camera_smoothing", "-0.1")).is_err());
        assert!(Scene::from_xml(&room("camera_smoothing", "NaN")).is_err());

        let scene = Scene::from_xml(&room("weight_smoothing", "1")).unwrap();
        assert_eq!(scene.tuning.weight_smoothing, 1.0);
    }
}
