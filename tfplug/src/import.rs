//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// This is useful for simple resources where the import ID maps directly to
/// a single attribute in the resource state.
///
/// Example: ID "F012345678901" -> state.id = "F012345678901"
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    tracing::debug!("Importing {} {}", request.type_name, request.id);
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

/// Splits a `/` separated import ID into the given attributes, plus the full
/// ID under `id`.
///
/// Example: ID "F012345678901/F052345678901" with parts
/// `["router_id", "nat_id"]` sets id, router_id and nat_id.
pub fn import_state_split_id(
    ctx: &Context,
    parts: &[&str],
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let segments: Vec<&str> = request.id.split('/').collect();
    if segments.len() != parts.len() || segments.iter().any(|s| s.is_empty()) {
        response.diagnostics.push(Diagnostic::error(
            "Invalid import ID",
            format!(
                "expected an ID of the form {}, got \"{}\"",
                parts.join("/"),
                request.id
            ),
        ));
        return;
    }

    import_state_passthrough_id(ctx, AttributePath::new("id"), request, response);
    let Some(imported) = response.imported_resources.last_mut() else {
        return;
    };
    for (name, value) in parts.iter().zip(segments) {
        if let Err(e) = imported
            .state
            .set_string(&AttributePath::new(name), value.to_string())
        {
            response
                .diagnostics
                .push(Diagnostic::error("Failed to set import ID", e.to_string()));
            return;
        }
    }
}
