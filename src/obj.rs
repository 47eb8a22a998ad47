//! Wavefront OBJ reader for the avatar mesh.
//!
//! Only `v`, `vn` and `f` records are used; texture coordinates, groups and
//! materials are skipped. Polygons are fanned into triangles and missing
//! normals are generated.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;

use crate::mesh::Mesh;

/// Parses an OBJ document into an indexed [`Mesh`].
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut parser = ObjParser::default();
    for (index, line) in data.lines().enumerate() {
        parser
            .line(line)
            .with_context(|| format!("line {}", index + 1))?;
    }
    parser.finish()
}

/// Position and normal reference of one face corner, resolved to zero-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjParser {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<[Corner; 3]>,
}

impl ObjParser {
    fn line(&mut self, line: &str) -> Result<()> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => self.positions.push(parse_vec3(fields).context("invalid vertex")?),
            Some("vn") => self.normals.push(parse_vec3(fields).context("invalid normal")?),
            Some("f") => {
                let polygon = fields
                    .map(|field| self.corner(field))
                    .collect::<Result<Vec<_>>>()
                    .context("invalid face")?;
                if polygon.len() < 3 {
                    bail!("faces must reference at least 3 vertices");
                }
                for i in 1..polygon.len() - 1 {
                    self.triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Resolves a `v`, `v/vt`, `v//vn` or `v/vt/vn` reference.
    fn corner(&self, field: &str) -> Result<Corner> {
        let mut refs = field.split('/');
        let position = refs
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i64>()?;
        let position = resolve(position, self.positions.len())
            .ok_or_else(|| anyhow!("vertex index {position} out of range"))?;
        let normal = refs
            .nth(1)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(|value| resolve(value, self.normals.len()));
        Ok(Corner { position, normal })
    }

    fn finish(self) -> Result<Mesh> {
        if self.positions.is_empty() {
            bail!("OBJ file does not define any vertices");
        }
        let mut mesh = Mesh::default();
        let mut emitted: HashMap<Corner, u32> = HashMap::new();
        let mut missing_normals = false;
        for triangle in &self.triangles {
            let [a, b, c] = triangle.map(|corner| {
                *emitted.entry(corner).or_insert_with(|| {
                    let normal = corner.normal.map(|i| self.normals[i]);
                    missing_normals |= normal.is_none();
                    mesh.push_vertex(
                        self.positions[corner.position],
                        normal.unwrap_or(Vec3::ZERO),
                    )
                })
            });
            mesh.push_triangle(a, b, c);
        }
        if missing_normals {
            mesh.compute_normals();
        }
        Ok(mesh)
    }
}

/// OBJ indices are one-based; negative values count back from the end.
fn resolve(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len + i,
        _ => return None,
    };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn parse_vec3<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        Ok(fields
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fans_quads_into_triangles() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn generates_missing_normals() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3 # tri\n";
        let mesh = load_obj_from_str(obj).unwrap();
        for chunk in mesh.vertices.chunks_exact(Mesh::STRIDE) {
            assert_eq!(Vec3::new(chunk[3], chunk[4], chunk[5]), Vec3::Z);
        }
    }

    #[test]
    fn keeps_supplied_normals_and_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf -3//1 -2//1 -1//1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(&mesh.vertices[3..6], &[0.0, 0.0, -1.0]);
    }

    #[test]
    fn reports_the_failing_line() {
        let err = load_obj_from_str("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert!(format!("{err:#}").contains("vertex index 2 out of range"));
        assert!(load_obj_from_str("# nothing here\n").is_err());
    }
}
