//! Tree-sitter query patterns for the capture battery.
//!
//! Capture names match [`CaptureTag::as_str`]; anything captured under another name is ignored
//! by the collector.

use crate::domain::model::CaptureTag;

/// Every `type_identifier`, qualified or not.
pub fn all_types() -> String {
    format!("((type_identifier) @{})", CaptureTag::Type)
}

/// `ns::Type`, including each level of `a::b::Type`.
pub fn qualified_types() -> String {
    format!(
        r#"
        (qualified_identifier
          scope: (namespace_identifier) @{scope}
          name: (type_identifier) @{name})
        "#,
        scope = CaptureTag::TypeScope,
        name = CaptureTag::TypeQual,
    )
}

/// `ns::Template<...>` and `ns::Template<...>::Member`.
pub fn qualified_template_types() -> String {
    format!(
        r#"
        (qualified_identifier
          scope: (namespace_identifier) @{scope}
          name: (template_type
            name: (type_identifier) @{name}))

        (qualified_identifier
          scope: (namespace_identifier) @{scope}
          name: (qualified_identifier
            scope: (template_type
              name: (type_identifier) @{name})
            name: (type_identifier) @{name}))
        "#,
        scope = CaptureTag::TypeScopeTemplate,
        name = CaptureTag::TypeQualTemplate,
    )
}

/// Bare identifiers on either side of a stream operator.
pub fn stream_symbols() -> String {
    format!(
        r#"
        (binary_expression
          operator: ["<<" ">>"]
          right: (identifier) @{symbol})

        (binary_expression
          left: (identifier) @{symbol}
          operator: ["<<" ">>"])
        "#,
        symbol = CaptureTag::Symbol,
    )
}

/// Bare identifiers called as functions or function templates.
pub fn function_symbols() -> String {
    format!(
        r#"
        (call_expression
          function: (template_function
            name: (identifier) @{func}))

        (call_expression
          function: (identifier) @{func})
        "#,
        func = CaptureTag::Func,
    )
}

/// `using a::b;` declarations.
///
/// This shape also matches `using namespace a::b;` and `using enum a::E;`; the collector drops
/// those matches.
pub fn using_declarations() -> String {
    format!(
        r#"
        (using_declaration
          (qualified_identifier) @{qualified}) @{decl}
        "#,
        qualified = CaptureTag::UsingQualType,
        decl = CaptureTag::UsingDecl,
    )
}

/// `using namespace a;` and `using namespace a::b;` directives.
pub fn using_namespaces() -> String {
    format!(
        r#"
        (using_declaration
          "namespace"
          [(identifier) (qualified_identifier)] @{id}) @{decl}
        "#,
        id = CaptureTag::UsingId,
        decl = CaptureTag::UsingNsDecl,
    )
}

/// The whole battery as one query source.
pub fn build_all() -> String {
    [
        all_types(),
        qualified_types(),
        qualified_template_types(),
        stream_symbols(),
        function_symbols(),
        using_declarations(),
        using_namespaces(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_mentions_every_tag() {
        let source = build_all();
        for tag in CaptureTag::ALL {
            assert!(
                source.contains(&format!("@{tag}")),
                "missing capture @{tag}"
            );
        }
    }
}
