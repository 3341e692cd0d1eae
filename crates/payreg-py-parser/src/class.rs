//! Class definition extraction and model classification.

use payreg_core::{FieldDescriptor, ModelKind};
use smallvec::SmallVec;
use tree_sitter::Node;

use crate::node_text;

/// A class definition as written in source.
///
/// Base and decorator names are kept as literal text; nothing is resolved
/// through imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Class name.
    pub name: String,

    /// Positional base expressions, e.g. `BaseModel` or `pydantic.BaseModel`.
    pub bases: SmallVec<[String; 2]>,

    /// Decorator names: the identifier, or the attribute of a dotted name.
    /// Call decorators contribute the name of the called function.
    pub decorators: SmallVec<[String; 2]>,

    /// Class-level fields in declaration order.
    pub fields: Vec<FieldDescriptor>,

    /// 1-based line of the `class` keyword.
    pub line: usize,
}

impl ClassDef {
    /// Classifies the class as a model.
    ///
    /// A literal base in `schema_bases` or a decorator in `dataclass_markers`
    /// makes a schema model. Otherwise any class with at least one field is a
    /// plain model. Classes without fields and without markers are not models.
    ///
    /// # Examples
    ///
    /// ```
    /// use payreg_core::ModelKind;
    /// use payreg_py_parser::PyParser;
    ///
    /// let mut parser = PyParser::new()?;
    /// let module = parser.parse("class Note(BaseModel):\n    title: str\n")?;
    /// let bases = vec!["BaseModel".to_owned()];
    /// assert_eq!(module.classes[0].classify(&bases, &[]), Some(ModelKind::Schema));
    /// # Ok::<(), payreg_py_parser::ParseError>(())
    /// ```
    pub fn classify(
        &self,
        schema_bases: &[String],
        dataclass_markers: &[String],
    ) -> Option<ModelKind> {
        let schema_base = self.bases.iter().any(|b| schema_bases.contains(b));
        let marked = self
            .decorators
            .iter()
            .any(|d| dataclass_markers.contains(d));

        if schema_base || marked {
            Some(ModelKind::Schema)
        } else if !self.fields.is_empty() {
            Some(ModelKind::Plain)
        } else {
            None
        }
    }
}

/// Extracts a [`ClassDef`] from a `class_definition` node.
pub(crate) fn extract_class(node: Node<'_>, source: &[u8]) -> Option<ClassDef> {
    let name = node_text(node.child_by_field_name("name")?, source)?.to_owned();

    let mut bases = SmallVec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            if matches!(
                base.kind(),
                "keyword_argument" | "comment" | "list_splat" | "dictionary_splat"
            ) {
                continue;
            }
            if let Some(text) = node_text(base, source) {
                bases.push(text.to_owned());
            }
        }
    }

    let decorators = decorator_nodes(node)
        .into_iter()
        .filter_map(|dec| decorator_name(dec, source))
        .collect();

    let fields = node
        .child_by_field_name("body")
        .map(|body| collect_fields(body, source))
        .unwrap_or_default();

    Some(ClassDef {
        name,
        bases,
        decorators,
        fields,
        line: node.start_position().row + 1,
    })
}

/// Returns the `decorator` nodes attached to a class or function definition.
pub(crate) fn decorator_nodes(definition: Node<'_>) -> SmallVec<[Node<'_>; 2]> {
    let mut found = SmallVec::new();
    let Some(parent) = definition.parent() else {
        return found;
    };
    if parent.kind() != "decorated_definition" {
        return found;
    }
    let mut cursor = parent.walk();
    found.extend(
        parent
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator"),
    );
    found
}

fn decorator_name(decorator: Node<'_>, source: &[u8]) -> Option<String> {
    let mut target = decorator.named_child(0)?;
    if target.kind() == "call" {
        target = target.child_by_field_name("function")?;
    }
    match target.kind() {
        "identifier" => node_text(target, source).map(str::to_owned),
        "attribute" => {
            node_text(target.child_by_field_name("attribute")?, source).map(str::to_owned)
        }
        _ => None,
    }
}

/// Collects class-level assignments from a class body.
///
/// Annotated assignments yield `(name, annotation, value)`. Plain assignments
/// yield one field per identifier target with an empty annotation. Tuple and
/// attribute targets are ignored.
fn collect_fields(body: Node<'_>, source: &[u8]) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            continue;
        };

        if let Some(annotation) = assignment.child_by_field_name("type") {
            let Some(left) = assignment
                .child_by_field_name("left")
                .filter(|n| n.kind() == "identifier")
            else {
                continue;
            };
            let name = node_text(left, source).unwrap_or_default();
            let type_text = node_text(annotation, source).unwrap_or_default();
            let default_text = assignment
                .child_by_field_name("right")
                .and_then(|right| node_text(right, source))
                .unwrap_or_default();
            fields.push(FieldDescriptor::new(name, type_text, default_text));
            continue;
        }

        // `a = b = value` nests the second assignment in `right`.
        let mut targets: SmallVec<[Node<'_>; 2]> = SmallVec::new();
        let mut current = assignment;
        let value = loop {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(left);
            }
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                other => break other,
            }
        };
        let default_text = value
            .and_then(|v| node_text(v, source))
            .unwrap_or_default();
        for target in targets.into_iter().filter(|t| t.kind() == "identifier") {
            if let Some(name) = node_text(target, source) {
                fields.push(FieldDescriptor::new(name, "", default_text));
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PyParser;

    fn classes(source: &str) -> Vec<ClassDef> {
        let mut parser = PyParser::new().unwrap();
        parser.parse(source).unwrap().classes.into_vec()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_annotated_fields_in_order() {
        let source = "\
class Note(BaseModel):
    title: str
    count: int = 0
    tags: list[str] = []
";
        let class = &classes(source)[0];
        assert_eq!(class.name, "Note");
        assert_eq!(class.bases.as_slice(), ["BaseModel"]);
        assert_eq!(
            class.fields,
            vec![
                FieldDescriptor::new("title", "str", ""),
                FieldDescriptor::new("count", "int", "0"),
                FieldDescriptor::new("tags", "list[str]", "[]"),
            ]
        );
    }

    #[test]
    fn test_plain_and_chained_assignments() {
        let source = "\
class Settings:
    debug = False
    host = port_alias = 'localhost'
    a, b = 1, 2
    self_ref.attr = 3
";
        let class = &classes(source)[0];
        assert_eq!(
            class.fields,
            vec![
                FieldDescriptor::new("debug", "", "False"),
                FieldDescriptor::new("host", "", "'localhost'"),
                FieldDescriptor::new("port_alias", "", "'localhost'"),
            ]
        );
    }

    #[test]
    fn test_classification() {
        let bases = strings(&["BaseModel", "pydantic.BaseModel"]);
        let markers = strings(&["dataclass"]);
        let source = "\
import pydantic
from dataclasses import dataclass

class A(pydantic.BaseModel):
    pass

@dataclass
class B:
    x: int

@dataclasses.dataclass(frozen=True)
class C:
    y: int

class D:
    z = 1

class E:
    def method(self):
        pass

class F(Base, metaclass=Meta):
    pass
";
        let kinds: Vec<_> = classes(source)
            .iter()
            .map(|c| (c.name.clone(), c.classify(&bases, &markers)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("A".to_owned(), Some(ModelKind::Schema)),
                ("B".to_owned(), Some(ModelKind::Schema)),
                ("C".to_owned(), Some(ModelKind::Schema)),
                ("D".to_owned(), Some(ModelKind::Plain)),
                ("E".to_owned(), None),
                ("F".to_owned(), None),
            ]
        );
    }

    #[test]
    fn test_alias_is_not_resolved() {
        let source = "\
from pydantic import BaseModel as Model

class Note(Model):
    title: str
";
        let bases = strings(&["BaseModel"]);
        let class = &classes(source)[0];
        // Falls back to plain because it has fields.
        assert_eq!(class.classify(&bases, &[]), Some(ModelKind::Plain));
    }

    #[test]
    fn test_keyword_bases_are_ignored() {
        let class = &classes("class F(Base, metaclass=Meta):\n    pass\n")[0];
        assert_eq!(class.bases.as_slice(), ["Base"]);
        assert_eq!(class.line, 1);
    }
}
