//! Go code generation from a parsed `Tree`.
//!
//! Each template becomes a function returning `goht.Template`. Static markup
//! is coalesced into `__buf.WriteString` literals by the writer; dynamic
//! values go through the `goht` runtime helpers.
//!
//! ```text
//! Tree → emit_file() → header, imports, raw Go code, one func per template
//! ```

use goht_lexer::{is_void_element, Token};
use goht_parser::{Attribute, AttributeKind, Element, FilterKind, NodeId, NodeKind, TextKind, Tree};

use crate::writer::{go_escape, Chunk, TemplateWriter};
use crate::CodegenError;

const HEADER: &str = "// Code generated by GoHT - DO NOT EDIT.\n\n";
const RUNTIME_IMPORTS: [&str; 3] = ["\"context\"", "\"io\"", "\"github.com/stackus/goht\""];

type Writer<'a, 'b, 'w> = &'a mut TemplateWriter<'b, 'w>;

/// Write the whole Go file for `tree`.
pub(crate) fn emit_file(w: Writer<'_, '_, '_>, tree: &Tree) -> Result<(), CodegenError> {
    let root = tree.root();
    w.write(HEADER)?;
    w.write(&format!("package {}\n\n", root.package))?;
    for import in RUNTIME_IMPORTS {
        w.write(&format!("import {import}\n"))?;
    }
    for import in root.imports.iter().filter(|i| !RUNTIME_IMPORTS.contains(&i.as_str())) {
        w.write(&format!("import {import}\n"))?;
    }
    w.write("\n")?;

    for &id in tree.children(NodeId::ROOT) {
        match &tree[id].kind {
            NodeKind::RawCode(raw) => {
                for token in &raw.tokens {
                    w.write_token(token)?;
                }
            }
            NodeKind::Template => emit_template(w, tree, id)?,
            _ => {}
        }
    }
    w.close()?;
    Ok(())
}

// =============================================================================
// Templates
// =============================================================================

fn emit_template(w: Writer<'_, '_, '_>, tree: &Tree, id: NodeId) -> Result<(), CodegenError> {
    let decl = &tree[id].token;
    w.reset_var_name();
    w.write("func ")?;
    w.write_token(decl)?;
    w.write(" goht.Template {\n")?;
    {
        let mut body = w.indent(1);
        body.write_indent(
            "return goht.TemplateFunc(func(ctx context.Context, __w io.Writer) (__err error) {\n",
        )?;
        {
            let mut inner = body.indent(1);
            write_buffer_prologue(&mut inner)?;
            inner.write_indent("var __children goht.Template\n")?;
            inner.write_indent("ctx, __children = goht.PopChildren(ctx)\n")?;
            inner.write_indent("_ = __children\n")?;
            emit_children(&mut inner, tree, id, false)?;
            write_buffer_epilogue(&mut inner)?;
        }
        body.write_indent("})\n")?;
    }
    w.write("}")?;
    tracing::debug!(template = %decl.lit, line = decl.line, "emitted template");
    Ok(())
}

fn write_buffer_prologue(w: Writer<'_, '_, '_>) -> Result<(), CodegenError> {
    w.write_indent("__buf, __isBuf := __w.(goht.Buffer)\n")?;
    w.write_indent("if !__isBuf {\n")?;
    w.indent(1).write_indent("__buf = goht.GetBuffer()\n")?;
    w.indent(1).write_indent("defer goht.ReleaseBuffer(__buf)\n")?;
    w.write_indent("}\n")?;
    Ok(())
}

fn write_buffer_epilogue(w: Writer<'_, '_, '_>) -> Result<(), CodegenError> {
    w.write_indent("if !__isBuf {\n")?;
    w.indent(1).write_indent("_, __err = __w.Write(__buf.Bytes())\n")?;
    w.write_indent("}\n")?;
    w.write_indent("return\n")?;
    Ok(())
}

// =============================================================================
// Nodes
// =============================================================================

fn emit_children(
    w: Writer<'_, '_, '_>,
    tree: &Tree,
    parent: NodeId,
    nuke_inner: bool,
) -> Result<(), CodegenError> {
    let children = tree.children(parent);
    let last = children.len().saturating_sub(1);
    let nukes_outer = |i: Option<usize>| {
        i.and_then(|i| children.get(i)).is_some_and(|&c| {
            matches!(&tree[c].kind, NodeKind::Element(el) if el.nuke_outer_whitespace)
        })
    };
    for (i, &child) in children.iter().enumerate() {
        if matches!(tree[child].kind, NodeKind::NewLine) {
            if nuke_inner && (i == 0 || i == last) {
                continue;
            }
            if nukes_outer(i.checked_sub(1)) || nukes_outer(Some(i + 1)) {
                continue;
            }
        }
        emit_node(w, tree, child)?;
    }
    Ok(())
}

fn emit_node(w: Writer<'_, '_, '_>, tree: &Tree, id: NodeId) -> Result<(), CodegenError> {
    let node = &tree[id];
    let token = &node.token;
    match &node.kind {
        NodeKind::Element(el) => emit_element(w, tree, id, el)?,
        NodeKind::Text(text) => emit_text(w, token, text.kind, false)?,
        NodeKind::NewLine => w.write_string_literal("\n")?,
        NodeKind::Doctype => {
            let Some(doctype) = doctype(&token.lit) else {
                return Err(CodegenError::UnknownDoctype {
                    name: token.lit.clone(),
                    line: token.line,
                    column: token.column,
                });
            };
            w.write_string_literal(doctype)?;
        }
        NodeKind::Comment if !token.lit.is_empty() => {
            w.write_string_literal(&format!("<!-- {} -->", token.lit))?;
        }
        NodeKind::Comment => {
            w.write_string_literal("<!--")?;
            emit_children(w, tree, id, false)?;
            w.write_string_literal("-->")?;
        }
        NodeKind::Unescape => emit_children(&mut w.unescaped(), tree, id, false)?,
        NodeKind::SilentScript => emit_silent_script(w, tree, id)?,
        NodeKind::OutputScript => emit_output(w, token)?,
        NodeKind::RenderCommand => emit_render(w, tree, id)?,
        NodeKind::ChildrenCommand => {
            w.write_checked(&[Chunk::Code("__err = __children.Render(ctx, __buf)")])?;
        }
        NodeKind::SlotCommand => {
            w.write_checked(&[
                Chunk::Code("__err = goht.GetSlot(ctx, \""),
                Chunk::Token(token),
                Chunk::Code("\").Render(ctx, __buf)"),
            ])?;
        }
        NodeKind::Filter(filter) => emit_filter(w, tree, id, filter.kind)?,
        NodeKind::Root(_) | NodeKind::RawCode(_) | NodeKind::Template => {}
    }
    Ok(())
}

fn emit_text(
    w: Writer<'_, '_, '_>,
    token: &Token,
    kind: TextKind,
    keep_final_newline: bool,
) -> Result<(), CodegenError> {
    match kind {
        TextKind::Plain => w.write_string_literal(&token.lit)?,
        TextKind::Escaped => w.write_string_literal(&html_escape(&token.lit))?,
        TextKind::Preserve => {
            w.write_string_literal(&preserve_newlines(&token.lit, keep_final_newline))?
        }
        TextKind::Dynamic => emit_dynamic_text(w, token)?,
    }
    Ok(())
}

/// `#{expr}` or `#{%fmt expr}`.
fn emit_dynamic_text(w: Writer<'_, '_, '_>, token: &Token) -> Result<(), CodegenError> {
    let (format, expr) = split_format(token);
    let (prefix, suffix) = if w.is_unescaped() {
        (format!("goht.Sprintf(\"{format}\", "), ")")
    } else {
        (format!("goht.EscapeString(goht.Sprintf(\"{format}\", "), "))")
    };
    w.write_string_indent_mapped(&prefix, &expr, suffix)?;
    Ok(())
}

fn emit_output(w: Writer<'_, '_, '_>, token: &Token) -> Result<(), CodegenError> {
    if w.is_unescaped() {
        w.write_string_indent_mapped("goht.Sprintf(\"%v\", ", token, ")")?;
    } else {
        w.write_string_indent_mapped("goht.EscapeString(goht.Sprintf(\"%v\", ", token, "))")?;
    }
    Ok(())
}

/// Split a leading `%verb` off an interpolation. The returned token carries
/// the expression and its own column.
fn split_format(token: &Token) -> (String, Token) {
    let lit = token.lit.as_str();
    if lit.starts_with('%') {
        if let Some((format, rest)) = lit.split_once(char::is_whitespace) {
            let expr = rest.trim_start();
            let offset = lit.chars().count() - expr.chars().count();
            let expr = Token::new(token.kind, expr, token.line, token.column + offset);
            return (go_escape(format), expr);
        }
    }
    ("%v".to_string(), token.clone())
}

// =============================================================================
// Elements
// =============================================================================

enum Part<'t> {
    Static(&'t str),
    Expr(&'t Token),
    ObjectRef(&'t Token),
}

fn value_attribute<'e>(el: &'e Element, name: &str) -> Option<&'e Token> {
    el.attributes
        .get(name)
        .filter(|a| a.kind == AttributeKind::Value)
        .and_then(|a| a.value.as_ref())
}

fn attribute_part(token: &Token) -> Part<'_> {
    if token.kind == goht_lexer::TokenKind::AttrDynamicValue {
        Part::Expr(token)
    } else {
        Part::Static(&token.lit)
    }
}

fn emit_element(
    w: Writer<'_, '_, '_>,
    tree: &Tree,
    id: NodeId,
    el: &Element,
) -> Result<(), CodegenError> {
    w.write_string_literal(&format!("<{}", el.tag))?;
    emit_id(w, el)?;
    emit_class(w, el)?;
    for (name, attr) in &el.attributes {
        let merged = matches!(name.as_str(), "id" | "class") && attr.kind == AttributeKind::Value;
        if !merged {
            emit_attribute(w, attr)?;
        }
    }
    if let Some(command) = &el.attributes_command {
        w.write_string_indent_mapped("goht.BuildAttributeList(", command, ")")?;
    }

    if is_void_element(&el.tag) {
        w.write_string_literal(">")?;
        return Ok(());
    }
    if el.is_self_closing {
        w.write_string_literal(" />")?;
        return Ok(());
    }
    w.write_string_literal(">")?;
    emit_children(w, tree, id, el.nuke_inner_whitespace)?;
    w.write_string_literal(&format!("</{}>", el.tag))?;
    Ok(())
}

/// Object reference id, `#id`, then the `id` attribute, joined with `_`.
fn emit_id(w: Writer<'_, '_, '_>, el: &Element) -> Result<(), CodegenError> {
    let mut parts = Vec::new();
    if let Some(object_ref) = &el.object_ref {
        parts.push(Part::ObjectRef(object_ref));
    }
    if let Some(id) = &el.id {
        parts.push(Part::Static(&id.lit));
    }
    if let Some(value) = value_attribute(el, "id") {
        parts.push(attribute_part(value));
    }
    if parts.is_empty() {
        return Ok(());
    }

    w.write_string_literal(" id=\"")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            w.write_string_literal("_")?;
        }
        match part {
            Part::Static(s) => w.write_string_literal(&html_escape(s))?,
            Part::Expr(t) => {
                w.write_string_indent_mapped("goht.EscapeString(goht.Sprintf(\"%v\", ", t, "))")?
            }
            Part::ObjectRef(t) => {
                w.write_string_indent_mapped("goht.EscapeString(goht.ObjectID(", t, "))")?
            }
        }
    }
    w.write_string_literal("\"")?;
    Ok(())
}

/// `.class` names, the object reference class, then the `class` attribute.
fn emit_class(w: Writer<'_, '_, '_>, el: &Element) -> Result<(), CodegenError> {
    let mut parts: Vec<Part<'_>> = el.classes.iter().map(|c| Part::Static(&c.lit)).collect();
    if let Some(object_ref) = &el.object_ref {
        parts.push(Part::ObjectRef(object_ref));
    }
    if let Some(value) = value_attribute(el, "class") {
        parts.push(attribute_part(value));
    }
    if parts.is_empty() {
        return Ok(());
    }

    if parts.iter().all(|p| matches!(p, Part::Static(_))) {
        let names: Vec<&str> = parts
            .iter()
            .filter_map(|p| match p {
                Part::Static(s) => Some(*s),
                _ => None,
            })
            .collect();
        w.write_string_literal(&format!(" class=\"{}\"", html_escape(&names.join(" "))))?;
        return Ok(());
    }

    let quoted: Vec<String> = parts
        .iter()
        .map(|p| match p {
            Part::Static(s) => format!("\"{}\"", go_escape(s)),
            _ => String::new(),
        })
        .collect();
    let mut chunks = vec![Chunk::Code(
        "_, __err = __buf.WriteString(goht.EscapeString(goht.BuildClassList(",
    )];
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            chunks.push(Chunk::Code(", "));
        }
        match part {
            Part::Static(_) => chunks.push(Chunk::Code(&quoted[i])),
            Part::Expr(t) => chunks.push(Chunk::Token(t)),
            Part::ObjectRef(t) => {
                chunks.push(Chunk::Code("goht.ObjectClass("));
                chunks.push(Chunk::Token(t));
                chunks.push(Chunk::Code(")"));
            }
        }
    }
    chunks.push(Chunk::Code(")))"));

    w.write_string_literal(" class=\"")?;
    w.write_checked(&chunks)?;
    w.write_string_literal("\"")?;
    Ok(())
}

fn emit_attribute(w: Writer<'_, '_, '_>, attr: &Attribute) -> Result<(), CodegenError> {
    let name = &attr.name.lit;
    match (attr.kind, &attr.value) {
        (AttributeKind::Boolean, Some(condition)) => {
            w.write_indent("if ")?;
            w.write_token(condition)?;
            w.write(" {\n")?;
            {
                let mut inner = w.indent(1);
                inner.write_string_literal(&format!(" {name}"))?;
                inner.close()?;
            }
            w.write_indent("}\n")?;
        }
        (AttributeKind::Value, Some(value)) if attr.is_dynamic() => {
            w.write_string_literal(&format!(" {name}=\""))?;
            w.write_string_indent_mapped("goht.EscapeString(goht.Sprintf(\"%v\", ", value, "))")?;
            w.write_string_literal("\"")?;
        }
        (AttributeKind::Value, Some(value)) => {
            w.write_string_literal(&format!(" {name}=\"{}\"", html_escape(&value.lit)))?;
        }
        _ => w.write_string_literal(&format!(" {name}"))?,
    }
    Ok(())
}

// =============================================================================
// Code and commands
// =============================================================================

fn is_else(code: &str) -> bool {
    code.strip_prefix("else")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t', '{']))
}

fn next_sibling(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let parent = tree[id].parent?;
    let siblings = tree.children(parent);
    let index = siblings.iter().position(|&s| s == id)?;
    siblings.get(index + 1).copied()
}

/// Go statements. Blocks written without braces get them here; an `else`
/// sibling reopens the brace of the block before it.
fn emit_silent_script(w: Writer<'_, '_, '_>, tree: &Tree, id: NodeId) -> Result<(), CodegenError> {
    let token = &tree[id].token;
    let code = token.lit.trim();
    let has_children = !tree.children(id).is_empty();
    let braced = code.ends_with('{') || code.ends_with(':');
    let continues = !braced && is_else(code);
    let else_follows = !braced
        && next_sibling(tree, id).is_some_and(|next| {
            matches!(tree[next].kind, NodeKind::SilentScript)
                && is_else(tree[next].token.lit.trim())
        });

    if !has_children && !continues && !else_follows {
        w.write_indent("")?;
        w.write_token(token)?;
        w.write("\n")?;
        return Ok(());
    }

    w.write_indent(if continues { "} " } else { "" })?;
    w.write_token(token)?;
    w.write(if braced { "\n" } else { " {\n" })?;
    {
        let mut inner = w.indent(1);
        emit_children(&mut inner, tree, id, false)?;
        inner.close()?;
    }
    if braced {
        return Ok(());
    }
    if !else_follows {
        w.write_indent("}\n")?;
    }
    Ok(())
}

fn emit_render(w: Writer<'_, '_, '_>, tree: &Tree, id: NodeId) -> Result<(), CodegenError> {
    let token = &tree[id].token;
    if tree.children(id).is_empty() {
        w.write_checked(&[
            Chunk::Code("__err = "),
            Chunk::Token(token),
            Chunk::Code(".Render(ctx, __buf)"),
        ])?;
        return Ok(());
    }

    let var = w.var_name();
    w.write_indent(&format!(
        "{var} := goht.TemplateFunc(func(ctx context.Context, __w io.Writer) (__err error) {{\n"
    ))?;
    {
        let mut inner = w.indent(1);
        write_buffer_prologue(&mut inner)?;
        emit_children(&mut inner, tree, id, false)?;
        write_buffer_epilogue(&mut inner)?;
    }
    w.write_indent("})\n")?;
    let call = format!(".Render(goht.PushChildren(ctx, {var}), __buf)");
    w.write_checked(&[Chunk::Code("__err = "), Chunk::Token(token), Chunk::Code(&call)])?;
    Ok(())
}

// =============================================================================
// Filters and static text
// =============================================================================

fn emit_filter(
    w: Writer<'_, '_, '_>,
    tree: &Tree,
    id: NodeId,
    kind: FilterKind,
) -> Result<(), CodegenError> {
    let wrapper = match kind {
        FilterKind::JavaScript => Some(("<script>\n", "</script>\n")),
        FilterKind::Css => Some(("<style>\n", "</style>\n")),
        FilterKind::Plain | FilterKind::Escaped | FilterKind::Preserve => None,
    };
    if let Some((open, _)) = wrapper {
        w.write_string_literal(open)?;
    }
    let children = tree.children(id);
    for (i, &child) in children.iter().enumerate() {
        let node = &tree[child];
        if let NodeKind::Text(text) = &node.kind {
            emit_text(w, &node.token, text.kind, i + 1 == children.len())?;
        }
    }
    if let Some((_, close)) = wrapper {
        w.write_string_literal(close)?;
    }
    Ok(())
}

fn doctype(name: &str) -> Option<&'static str> {
    let doctype = match name.to_ascii_lowercase().as_str() {
        "" | "5" | "html" => "<!DOCTYPE html>",
        "xml" => "<?xml version='1.0' encoding='utf-8' ?>",
        "strict" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#,
        "frameset" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#,
        "transitional" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#,
        "1.1" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#,
        "basic" => r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#,
        "mobile" => r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#,
        _ => return None,
    };
    Some(doctype)
}

pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn preserve_newlines(s: &str, keep_final_newline: bool) -> String {
    match s.strip_suffix('\n') {
        Some(body) if keep_final_newline => format!("{}\n", body.replace('\n', "&#x000A;")),
        _ => s.replace('\n', "&#x000A;"),
    }
}
