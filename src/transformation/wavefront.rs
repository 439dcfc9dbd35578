use crate::transformation::hacd::ConvexDecomposition;
use obj::{Group, IndexTuple, ObjData, ObjError, Object, SimplePolygon};
use std::path::PathBuf;

impl ConvexDecomposition {
    /// Outputs the convex pieces as a Wavefront (`.obj`) file at the given path.
    ///
    /// Each piece is written as its own group, named after its layer.
    ///
    /// This function is enabled by the `wavefront` feature flag.
    pub fn to_obj_file(&self, path: &PathBuf) -> Result<(), ObjError> {
        let mut file = std::fs::File::create(path)?;
        let layers = self.layers();

        let groups = (0..self.num_hulls())
            .map(|layer| Group {
                polys: self
                    .indices()
                    .iter()
                    .zip(layers)
                    .filter(|(_, l)| **l as usize == layer)
                    .map(|(tri, _)| {
                        SimplePolygon(
                            tri.iter()
                                .map(|i| IndexTuple(*i as usize, None, None))
                                .collect(),
                        )
                    })
                    .collect(),
                name: format!("hull{}", layer),
                index: layer,
                material: None,
            })
            .collect();

        ObjData {
            position: self
                .vertices()
                .iter()
                .map(|v| [v.x as f32, v.y as f32, v.z as f32])
                .collect(),
            objects: vec![Object {
                groups,
                name: "convex_decomposition".to_string(),
            }],
            ..Default::default()
        }
        .write_to_buf(&mut file)
    }
}
