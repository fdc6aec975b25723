use std::ffi::OsStr;

use clap::builder::StyledStr;
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use kube::config::Kubeconfig;

/// Create an `ArgValueCompleter` that lists contexts from the active kubeconfig.
///
/// The current context is offered first and marked in the candidate help,
/// alongside the cluster each context points to.
pub fn context_value_completer() -> ArgValueCompleter {
    ArgValueCompleter::new(|input: &OsStr| -> Vec<CompletionCandidate> {
        let Ok(kubeconfig) = Kubeconfig::read() else {
            return Vec::new();
        };
        context_candidates(&kubeconfig, input.to_string_lossy().trim())
    })
}

fn context_candidates(kubeconfig: &Kubeconfig, prefix: &str) -> Vec<CompletionCandidate> {
    let current = kubeconfig.current_context.as_deref();

    let mut candidates: Vec<(bool, CompletionCandidate)> = kubeconfig
        .contexts
        .iter()
        .filter(|named| named.name.starts_with(prefix))
        .map(|named| {
            let is_current = current == Some(named.name.as_str());
            let mut help = Vec::new();
            if is_current {
                help.push(String::from("[current]"));
            }
            if let Some(context) = &named.context {
                help.push(format!("cluster={}", context.cluster));
            }

            let mut candidate = CompletionCandidate::new(named.name.as_str());
            if !help.is_empty() {
                candidate = candidate.help(Some(StyledStr::from(help.join(" "))));
            }
            (is_current, candidate)
        })
        .collect();

    // Stable sort keeps kubeconfig order among the rest.
    candidates.sort_by_key(|(is_current, _)| !is_current);
    candidates
        .into_iter()
        .map(|(_, candidate)| candidate)
        .collect()
}
