use crate::config::OutputMode;

use super::table::RenderMode;

/// Render mode chosen for a route, plus whether the route's own preference
/// had to be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDecision {
    pub mode: RenderMode,
    pub overridden: bool,
}

/// Resolve a route's render mode from the site output setting and the
/// route's `prerender` preference (if it declared one).
///
/// - `static`: every route is pre-rendered. A route asking for
///   `prerender = false` is still pre-rendered and flagged as overridden.
/// - `server`: on demand unless the route asks for `prerender = true`.
/// - `hybrid`: pre-rendered unless the route asks for `prerender = false`.
pub fn resolve_render_mode(output: OutputMode, prerender: Option<bool>) -> ModeDecision {
    match (output, prerender) {
        (OutputMode::Static, Some(false)) => ModeDecision {
            mode: RenderMode::Static,
            overridden: true,
        },
        (OutputMode::Static, _) => ModeDecision {
            mode: RenderMode::Static,
            overridden: false,
        },
        (OutputMode::Server, Some(true)) | (OutputMode::Hybrid, None | Some(true)) => {
            ModeDecision {
                mode: RenderMode::Static,
                overridden: false,
            }
        }
        (OutputMode::Server, None | Some(false)) | (OutputMode::Hybrid, Some(false)) => {
            ModeDecision {
                mode: RenderMode::Server,
                overridden: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(output: OutputMode, prerender: Option<bool>) -> RenderMode {
        resolve_render_mode(output, prerender).mode
    }

    #[test]
    fn test_static_output_prerenders_everything() {
        assert_eq!(mode(OutputMode::Static, None), RenderMode::Static);
        assert_eq!(mode(OutputMode::Static, Some(true)), RenderMode::Static);

        let decision = resolve_render_mode(OutputMode::Static, Some(false));
        assert_eq!(decision.mode, RenderMode::Static);
        assert!(decision.overridden);
    }

    #[test]
    fn test_server_output_defaults_to_server() {
        assert_eq!(mode(OutputMode::Server, None), RenderMode::Server);
        assert_eq!(mode(OutputMode::Server, Some(false)), RenderMode::Server);
        assert_eq!(mode(OutputMode::Server, Some(true)), RenderMode::Static);
    }

    #[test]
    fn test_hybrid_output_defaults_to_static() {
        assert_eq!(mode(OutputMode::Hybrid, None), RenderMode::Static);
        assert_eq!(mode(OutputMode::Hybrid, Some(true)), RenderMode::Static);
        assert_eq!(mode(OutputMode::Hybrid, Some(false)), RenderMode::Server);
        assert!(!resolve_render_mode(OutputMode::Hybrid, Some(false)).overridden);
    }
}
