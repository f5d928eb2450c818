//! The code artifact: analysis source fragments and the parameter table

use crate::error::Result;
use crate::exporter::{Document, Exporter};
use multiverse_core::BranchRegistry;
use multiverse_exec::{Multiverse, Pipeline};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// `code.json`: ordered source fragments plus each parameter's options.
///
/// Parameters serialize as a JSON object whose keys keep declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeDocument {
    pub code: Vec<String>,
    pub parameters: Vec<(String, Vec<String>)>,
}

impl Document for CodeDocument {}

impl Serialize for CodeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("CodeDocument", 2)?;
        doc.serialize_field("code", &self.code)?;
        doc.serialize_field("parameters", &OrderedParameters(&self.parameters))?;
        doc.end()
    }
}

struct OrderedParameters<'a>(&'a [(String, Vec<String>)]);

impl Serialize for OrderedParameters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, options) in self.0 {
            map.serialize_entry(name, options)?;
        }
        map.end()
    }
}

/// Builds `code.json` from a multiverse's pipeline and declarations
#[derive(Debug, Clone)]
pub struct CodeExporter<'a> {
    registry: &'a BranchRegistry,
    pipeline: &'a Pipeline,
    max_fragment_lines: usize,
}

impl<'a> CodeExporter<'a> {
    /// Exporter using the multiverse's configured fragment size
    pub fn new(multiverse: &'a Multiverse) -> Self {
        Self::from_parts(
            multiverse.registry(),
            multiverse.pipeline(),
            multiverse.config().max_fragment_lines,
        )
    }

    pub fn from_parts(
        registry: &'a BranchRegistry,
        pipeline: &'a Pipeline,
        max_fragment_lines: usize,
    ) -> Self {
        Self {
            registry,
            pipeline,
            max_fragment_lines: max_fragment_lines.max(1),
        }
    }

    /// Override the maximum number of lines per fragment
    pub fn max_fragment_lines(mut self, lines: usize) -> Self {
        self.max_fragment_lines = lines.max(1);
        self
    }
}

impl Exporter for CodeExporter<'_> {
    type Document = CodeDocument;

    const FILE_NAME: &'static str = "code.json";

    fn document(&self) -> Result<CodeDocument> {
        let code = self
            .pipeline
            .render(self.registry)
            .iter()
            .flat_map(|step| split_fragment(step, self.max_fragment_lines))
            .collect();

        let parameters = self
            .registry
            .parameters()
            .iter()
            .map(|p| {
                let options = p.option_names().into_iter().map(str::to_string).collect();
                (p.name().to_string(), options)
            })
            .collect();

        Ok(CodeDocument { code, parameters })
    }
}

fn split_fragment(text: &str, max_lines: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return vec![String::new()];
    }
    lines.chunks(max_lines).map(|chunk| chunk.join("\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiverse_core::{BranchOption, Condition};
    use multiverse_exec::Step;

    fn registry() -> BranchRegistry {
        let mut registry = BranchRegistry::new();
        registry
            .declare("zeta", [BranchOption::new("z1"), BranchOption::new("z2")])
            .unwrap();
        registry
            .declare(
                "alpha",
                [
                    BranchOption::new("a1").when(Condition::is("zeta", "z1")),
                    BranchOption::new("a2"),
                ],
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("a\nb\nc", 2), vec!["a\nb", "c"]);
        assert_eq!(split_fragment("a\nb", 2), vec!["a\nb"]);
        assert_eq!(split_fragment("", 2), vec![""]);
    }

    #[test]
    fn test_parameters_keep_declaration_order() {
        let registry = registry();
        let pipeline = Pipeline::new().step(Step::fixed("load", "d <- read()", |_| Ok(())));
        let doc = CodeExporter::from_parts(&registry, &pipeline, 12)
            .document()
            .unwrap();
        assert_eq!(
            doc.parameters,
            vec![
                ("zeta".to_string(), vec!["z1".to_string(), "z2".to_string()]),
                ("alpha".to_string(), vec!["a1".to_string(), "a2".to_string()]),
            ]
        );

        let json = String::from_utf8(doc.to_json().unwrap()).unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
        assert!(json.find("\"code\"").unwrap() < json.find("\"parameters\"").unwrap());
    }

    #[test]
    fn test_fragments_split_long_steps() {
        let registry = registry();
        let long: Vec<String> = (0..5).map(|i| format!("x{i} <- {i}")).collect();
        let pipeline = Pipeline::new()
            .step(Step::fixed("setup", long.join("\n"), |_| Ok(())))
            .step(Step::fixed("done", "print(x4)", |_| Ok(())));

        let doc = CodeExporter::from_parts(&registry, &pipeline, 12)
            .max_fragment_lines(3)
            .document()
            .unwrap();
        // "# setup" header plus 5 lines: 3 + 3, then the second step
        assert_eq!(doc.code.len(), 3);
        assert_eq!(doc.code[0], "# setup\nx0 <- 0\nx1 <- 1");
        assert_eq!(doc.code[1], "x2 <- 2\nx3 <- 3\nx4 <- 4");
        assert_eq!(doc.code[2], "# done\nprint(x4)");
    }

    #[test]
    fn test_json_shape() {
        let registry = registry();
        let pipeline = Pipeline::new().step(Step::branch("pick", "alpha", |_, _| Ok(())));
        let doc = CodeExporter::from_parts(&registry, &pipeline, 12)
            .document()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value["code"].as_array().unwrap().len(), 1);
        assert_eq!(value["parameters"]["alpha"][1], "a2");
    }
}
