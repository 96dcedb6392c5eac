//! Builds a [`Workspace`] from Java source files.
//!
//! The loader is structural only: types are named as written (qualified
//! names keep their last segment), nothing is resolved against imports or a
//! classpath. A simple name that matches a type parameter in scope becomes a
//! type variable owned by the declaring class or method, anything else a
//! class type.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor};
use walkdir::WalkDir;

use crate::error::Result;
use crate::lang::java::{NESTED_TYPE_KINDS, TYPE_DECLARATION_QUERY};
use crate::lang::{Java, Language};

use super::{
    ClassDecl, ClassId, ClassKind, FieldDecl, JavaType, MethodDecl, Modifiers, Parameter,
    PrimitiveKind, TypeParam, TypeVarOwner, Visibility, WildcardBound, Workspace,
};

/// Loads Java classes into a workspace.
#[derive(Debug, Clone, Default)]
pub struct JavaLoader {
    exclude_patterns: Vec<String>,
}

impl JavaLoader {
    /// Create a loader with no exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip files matching the glob (relative to the loaded root).
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Skip files matching any of the globs.
    pub fn excludes(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Collect the Java files below `root`, sorted by path.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let exclude_set = build_glob_set(&self.exclude_patterns)?;
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !Java.matches_path(path) {
                continue;
            }
            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(rel_path) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Load every Java file below `root` into a new workspace.
    pub fn load_dir(&self, root: impl AsRef<Path>) -> Result<Workspace> {
        let mut ws = Workspace::new();
        for file in self.collect(root.as_ref())? {
            let source = std::fs::read_to_string(&file)?;
            let loaded = self.load_source(&mut ws, &file, &source)?;
            tracing::debug!(file = %file.display(), classes = loaded.len(), "loaded java file");
        }
        Ok(ws)
    }

    /// Parse one compilation unit and add its classes to `ws`.
    pub fn load_source(
        &self,
        ws: &mut Workspace,
        path: &Path,
        source: &str,
    ) -> Result<Vec<ClassId>> {
        let tree = Java.parse_file(path, source)?;
        let query = Java.query(TYPE_DECLARATION_QUERY)?;
        let decl_index = query
            .capture_index_for_name("decl")
            .unwrap_or_default();
        let src = source.as_bytes();

        let mut declarations = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), src);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                if capture.index == decl_index {
                    declarations.push(capture.node);
                }
            }
        }

        let mut loaded = Vec::new();
        for node in declarations {
            let id = load_type_declaration(ws, node, src, path);
            loaded.push(id);
        }
        Ok(loaded)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

// Type parameters visible inside a declaration, innermost last.
#[derive(Debug, Clone, Default)]
struct TypeScope(Vec<(String, TypeVarOwner)>);

impl TypeScope {
    fn of_class(class: &str, params: &[TypeParam]) -> Self {
        Self(
            params
                .iter()
                .map(|p| (p.name().to_string(), TypeVarOwner::class(class)))
                .collect(),
        )
    }

    fn with_method(&self, class: &str, method: &str, params: &[TypeParam]) -> Self {
        let mut scope = self.clone();
        scope.0.extend(
            params
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name().to_string(), TypeVarOwner::method(class, method, i))),
        );
        scope
    }

    fn resolve(&self, name: &str) -> Option<JavaType> {
        self.0
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(n, owner)| JavaType::type_variable(n.as_str(), owner.clone()))
    }
}

fn class_kind(node_kind: &str) -> ClassKind {
    match node_kind {
        "interface_declaration" => ClassKind::Interface,
        "enum_declaration" => ClassKind::Enum,
        "record_declaration" => ClassKind::Record,
        _ => ClassKind::Class,
    }
}

// Members of a class body. Enum members follow the constants, inside
// `enum_body_declarations`.
fn body_members(body: Node<'_>) -> Vec<Node<'_>> {
    let mut members = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(named_children(child));
        } else {
            members.push(child);
        }
    }
    members
}

fn load_type_declaration(ws: &mut Workspace, node: Node<'_>, src: &[u8], path: &Path) -> ClassId {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string())
        .unwrap_or_default();
    let kind = class_kind(node.kind());

    let type_params = node
        .child_by_field_name("type_parameters")
        .map(|n| type_parameters(n, src))
        .unwrap_or_default();
    let scope = TypeScope::of_class(&name, &type_params);

    let mut decl = ClassDecl::with_kind(name.as_str(), kind).in_file(path);
    decl.type_params = type_params;
    decl.modifiers = modifiers(child_of_kind(node, "modifiers"), src).0;

    if let Some(superclass) = node.child_by_field_name("superclass") {
        decl.extends.extend(type_list(superclass, src, &scope));
    }
    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        decl.implements.extend(type_list(interfaces, src, &scope));
    }
    if let Some(extends) = child_of_kind(node, "extends_interfaces") {
        decl.extends.extend(type_list(extends, src, &scope));
    }

    let members = node
        .child_by_field_name("body")
        .map(body_members)
        .unwrap_or_default();
    for member in &members {
        if NESTED_TYPE_KINDS.contains(&member.kind())
            && let Some(n) = member.child_by_field_name("name")
        {
            decl.nested.push(text(n, src).to_string());
        }
    }

    let is_interface = decl.is_interface();
    let id = ws.add_class(decl);

    let mut methods = Vec::new();
    for member in members {
        match member.kind() {
            "method_declaration" => {
                methods.push(method_declaration(member, src, &name, &scope, is_interface));
            }
            "field_declaration" | "constant_declaration" => {
                for field in field_declaration(member, src, &scope, is_interface) {
                    ws.add_field(id, field);
                }
            }
            _ => {}
        }
    }

    // A record declares a public accessor for every component it does not
    // spell out itself.
    if kind == ClassKind::Record
        && let Some(components) = node.child_by_field_name("parameters")
    {
        for component in formal_parameters(components, src, &scope) {
            let declared = methods
                .iter()
                .any(|m| m.name == component.name && m.params.is_empty());
            if !declared {
                methods.push(
                    MethodDecl::new(component.name)
                        .public()
                        .returns(component.ty),
                );
            }
        }
    }
    for method in methods {
        ws.add_method(id, method);
    }

    id
}

fn type_parameters(node: Node<'_>, src: &[u8]) -> Vec<TypeParam> {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| c.kind() == "type_identifier" || c.kind() == "identifier")
                .map(|n| TypeParam::new(text(n, src)))
        })
        .collect()
}

// Returns the modifiers and annotation names.
fn modifiers(node: Option<Node<'_>>, src: &[u8]) -> (Modifiers, Vec<String>) {
    let mut mods = Modifiers::default();
    let mut annotations = Vec::new();
    let Some(node) = node else {
        return (mods, annotations);
    };

    for child in children(node) {
        match child.kind() {
            "public" => mods.visibility = Visibility::Public,
            "protected" => mods.visibility = Visibility::Protected,
            "private" => mods.visibility = Visibility::Private,
            "abstract" => mods.is_abstract = true,
            "static" => mods.is_static = true,
            "final" => mods.is_final = true,
            "default" => mods.is_default = true,
            "marker_annotation" | "annotation" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let name = text(name, src);
                    let simple = name.rsplit('.').next().unwrap_or(name);
                    annotations.push(simple.to_string());
                }
            }
            _ => {}
        }
    }
    (mods, annotations)
}

fn type_list(node: Node<'_>, src: &[u8], scope: &TypeScope) -> Vec<JavaType> {
    let mut types = Vec::new();
    for child in named_children(node) {
        if child.kind() == "type_list" {
            types.extend(type_list(child, src, scope));
        } else if Java::is_type_node(child.kind()) {
            types.push(java_type(child, src, scope));
        }
    }
    types
}

fn method_declaration(
    node: Node<'_>,
    src: &[u8],
    class: &str,
    class_scope: &TypeScope,
    in_interface: bool,
) -> MethodDecl {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string())
        .unwrap_or_default();

    let type_params = node
        .child_by_field_name("type_parameters")
        .map(|n| type_parameters(n, src))
        .unwrap_or_default();
    let scope = class_scope.with_method(class, &name, &type_params);

    let (mut mods, annotations) = modifiers(child_of_kind(node, "modifiers"), src);
    let has_body = node.child_by_field_name("body").is_some();
    if in_interface {
        if mods.visibility == Visibility::Package {
            mods.visibility = Visibility::Public;
        }
        if !has_body && !mods.is_static && !mods.is_default {
            mods.is_abstract = true;
        }
    }

    let mut return_type = node
        .child_by_field_name("type")
        .map(|t| java_type(t, src, &scope))
        .unwrap_or(JavaType::VOID);
    if let Some(dims) = node.child_by_field_name("dimensions") {
        return_type = wrap_dimensions(return_type, dims, src);
    }

    let params = node
        .child_by_field_name("parameters")
        .map(|p| formal_parameters(p, src, &scope))
        .unwrap_or_default();

    MethodDecl {
        name,
        modifiers: mods,
        annotations,
        type_params,
        return_type,
        params,
        has_body,
    }
}

fn formal_parameters(node: Node<'_>, src: &[u8], scope: &TypeScope) -> Vec<Parameter> {
    let mut params = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "formal_parameter" => {
                let mut ty = child
                    .child_by_field_name("type")
                    .map(|t| java_type(t, src, scope))
                    .unwrap_or_else(JavaType::object);
                if let Some(dims) = child.child_by_field_name("dimensions") {
                    ty = wrap_dimensions(ty, dims, src);
                }
                let name = child
                    .child_by_field_name("name")
                    .map(|n| text(n, src).to_string())
                    .unwrap_or_default();
                params.push(Parameter::new(name, ty));
            }
            // `T... xs` is an array parameter.
            "spread_parameter" => {
                let parts = named_children(child);
                let ty = parts
                    .iter()
                    .find(|c| Java::is_type_node(c.kind()))
                    .map(|t| java_type(*t, src, scope))
                    .unwrap_or_else(JavaType::object)
                    .array_of();
                let name = parts
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .or_else(|| parts.iter().rev().find(|c| c.kind() == "identifier").copied())
                    .map(|n| text(n, src).to_string())
                    .unwrap_or_default();
                params.push(Parameter::new(name, ty));
            }
            _ => {}
        }
    }
    params
}

fn field_declaration(
    node: Node<'_>,
    src: &[u8],
    scope: &TypeScope,
    in_interface: bool,
) -> Vec<FieldDecl> {
    let (mut mods, _) = modifiers(child_of_kind(node, "modifiers"), src);
    if in_interface {
        mods.visibility = Visibility::Public;
        mods.is_static = true;
        mods.is_final = true;
    }
    let Some(ty) = node
        .child_by_field_name("type")
        .map(|t| java_type(t, src, scope))
    else {
        return Vec::new();
    };

    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor)
        .filter_map(|declarator| {
            let name = declarator.child_by_field_name("name")?;
            let mut field_ty = ty.clone();
            if let Some(dims) = declarator.child_by_field_name("dimensions") {
                field_ty = wrap_dimensions(field_ty, dims, src);
            }
            Some(FieldDecl {
                name: text(name, src).to_string(),
                ty: field_ty,
                modifiers: mods.clone(),
            })
        })
        .collect()
}

fn wrap_dimensions(mut ty: JavaType, dims: Node<'_>, src: &[u8]) -> JavaType {
    for _ in 0..text(dims, src).matches('[').count() {
        ty = ty.array_of();
    }
    ty
}

fn simple_name(qualified: &str) -> &str {
    let raw = qualified.split('<').next().unwrap_or(qualified);
    raw.rsplit('.').next().unwrap_or(raw).trim()
}

fn java_type(node: Node<'_>, src: &[u8], scope: &TypeScope) -> JavaType {
    match node.kind() {
        "void_type" | "integral_type" | "floating_point_type" | "boolean_type" => {
            PrimitiveKind::from_keyword(text(node, src).trim())
                .map(JavaType::primitive)
                .unwrap_or_else(|| JavaType::class(text(node, src)))
        }
        "type_identifier" | "identifier" => {
            let name = text(node, src);
            scope
                .resolve(name)
                .unwrap_or_else(|| JavaType::class(name))
        }
        "scoped_type_identifier" => JavaType::class(simple_name(text(node, src))),
        "generic_type" => {
            let parts = named_children(node);
            let name = parts
                .iter()
                .find(|c| c.kind() == "type_identifier" || c.kind() == "scoped_type_identifier")
                .map(|n| simple_name(text(*n, src)).to_string())
                .unwrap_or_default();
            let args = parts
                .iter()
                .find(|c| c.kind() == "type_arguments")
                .map(|a| {
                    named_children(*a)
                        .into_iter()
                        .filter(|c| Java::is_type_node(c.kind()))
                        .map(|c| java_type(c, src, scope))
                        .collect()
                })
                .unwrap_or_default();
            JavaType::generic(name, args)
        }
        "array_type" => {
            let element = node
                .child_by_field_name("element")
                .map(|e| java_type(e, src, scope))
                .unwrap_or_else(JavaType::object);
            match node.child_by_field_name("dimensions") {
                Some(dims) => wrap_dimensions(element, dims, src),
                None => element.array_of(),
            }
        }
        "annotated_type" => named_children(node)
            .into_iter()
            .rev()
            .find(|c| Java::is_type_node(c.kind()))
            .map(|c| java_type(c, src, scope))
            .unwrap_or_else(JavaType::object),
        "wildcard" => {
            let bound_kind = children(node).iter().find_map(|c| match c.kind() {
                "extends" => Some(WildcardBound::Extends),
                "super" => Some(WildcardBound::Super),
                _ => None,
            });
            let bound_type = named_children(node)
                .into_iter()
                .find(|c| Java::is_type_node(c.kind()))
                .map(|c| java_type(c, src, scope));
            match (bound_kind, bound_type) {
                (Some(kind), Some(ty)) => JavaType::bounded_wildcard(kind, ty),
                _ => JavaType::wildcard(),
            }
        }
        _ => JavaType::class(simple_name(text(node, src))),
    }
}
