//! Signature outlines of classes, used for previews and diffs.
//!
//! An outline shows declarations only: class headers with their type
//! parameters and super references, field declarations, and method
//! signatures. Method bodies are elided as `{ ... }`.

use super::{ClassDecl, ClassId, MethodDecl, Modifiers, TypeParam, Workspace};

/// Render the outline of a single class.
pub fn class_outline(ws: &Workspace, id: ClassId) -> String {
    let decl = ws.class(id);
    let mut out = String::new();

    out.push_str(&class_header(decl));
    out.push_str(" {\n");

    for (_, field) in ws.fields_of(id) {
        let mods = modifier_prefix(&field.modifiers, false);
        out.push_str(&format!("    {}{} {};\n", mods, field.ty, field.name));
    }
    for (_, method) in ws.methods_of(id) {
        for annotation in &method.annotations {
            out.push_str(&format!("    @{annotation}\n"));
        }
        out.push_str(&format!("    {}\n", method_line(method, decl.is_interface())));
    }

    out.push_str("}\n");
    out
}

/// Render the outline of every class, in workspace order.
pub fn workspace_outline(ws: &Workspace) -> String {
    ws.classes()
        .map(|(id, _)| class_outline(ws, id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a method signature line, e.g. `public abstract void feed(TFeed0 food);`.
pub fn method_line(method: &MethodDecl, in_interface: bool) -> String {
    let mut line = modifier_prefix(&method.modifiers, in_interface);
    if !method.type_params.is_empty() {
        line.push_str(&type_param_list(&method.type_params));
        line.push(' ');
    }
    let params: Vec<_> = method
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    line.push_str(&format!(
        "{} {}({})",
        method.return_type,
        method.name,
        params.join(", ")
    ));
    if method.has_body {
        line.push_str(" { ... }");
    } else {
        line.push(';');
    }
    line
}

fn class_header(decl: &ClassDecl) -> String {
    let mut header = modifier_prefix(&decl.modifiers, decl.is_interface());
    header.push_str(decl.kind.keyword());
    header.push(' ');
    header.push_str(&decl.name);
    if !decl.type_params.is_empty() {
        header.push_str(&type_param_list(&decl.type_params));
    }
    if !decl.extends.is_empty() {
        let list: Vec<_> = decl.extends.iter().map(|t| t.to_string()).collect();
        header.push_str(&format!(" extends {}", list.join(", ")));
    }
    if !decl.implements.is_empty() {
        let list: Vec<_> = decl.implements.iter().map(|t| t.to_string()).collect();
        header.push_str(&format!(" implements {}", list.join(", ")));
    }
    header
}

fn type_param_list(params: &[TypeParam]) -> String {
    let names: Vec<_> = params.iter().map(|p| p.name()).collect();
    format!("<{}>", names.join(", "))
}

// Interface members are implicitly abstract; the keyword is left out there.
fn modifier_prefix(modifiers: &Modifiers, in_interface: bool) -> String {
    let mut prefix = String::new();
    let visibility = modifiers.visibility.keyword();
    if !visibility.is_empty() {
        prefix.push_str(visibility);
        prefix.push(' ');
    }
    if modifiers.is_default {
        prefix.push_str("default ");
    }
    if modifiers.is_abstract && !in_interface {
        prefix.push_str("abstract ");
    }
    if modifiers.is_static {
        prefix.push_str("static ");
    }
    if modifiers.is_final {
        prefix.push_str("final ");
    }
    prefix
}
