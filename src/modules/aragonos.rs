//! The `aragonos` module
//!
//! `connect` opens a block bound to a DAO. Its eager evaluator resolves the
//! DAO name through the provider and binds `$dao` inside the block.

use lazy_static::lazy_static;
use regex_lite::Regex;
use tracing::debug;

use super::std_module::resolve_argument;
use super::types::{
    ArgCompletionContext, CommandDescriptor, EagerContext, EagerFuture, HelperDescriptor,
    ModuleDescriptor,
};
use crate::bindings::{Binding, BindingSpace};
use crate::engine::errors::EagerError;

pub const ARAGONOS_MODULE: &str = "aragonos";

/// Suffix appended to bare DAO names before asking the provider
pub const ARAGON_ID_SUFFIX: &str = ".aragonid.eth";

pub const ANY_ENTITY: &str = "ANY_ENTITY";

pub const KNOWN_REPOS: &[&str] = &[
    "acl",
    "agent",
    "finance",
    "kernel",
    "token-manager",
    "vault",
    "voting",
];

pub const KNOWN_ROLES: &[&str] = &[
    "BURN_ROLE",
    "CREATE_PAYMENTS_ROLE",
    "CREATE_PERMISSIONS_ROLE",
    "CREATE_VOTES_ROLE",
    "EXECUTE_ROLE",
    "MANAGE_APPS_ROLE",
    "MINT_ROLE",
    "MODIFY_QUORUM_ROLE",
    "MODIFY_SUPPORT_ROLE",
    "TRANSFER_ROLE",
];

lazy_static! {
    static ref ADDRESS: Option<Regex> = Regex::new(r"^0x[0-9a-fA-F]{40}$").ok();
}

pub fn is_address(s: &str) -> bool {
    ADDRESS.as_ref().map_or(false, |re| re.is_match(s))
}

pub fn aragonos_module() -> ModuleDescriptor {
    ModuleDescriptor::new(ARAGONOS_MODULE)
        .with_command(
            CommandDescriptor::new("connect", "Open a block acting on a DAO").with_eager(connect_eager),
        )
        .with_command(
            CommandDescriptor::new("install", "Install a new app instance").with_arg_completions(
                |ctx: &ArgCompletionContext<'_>| match ctx.index {
                    0 => KNOWN_REPOS.iter().map(|r| r.to_string()).collect(),
                    _ => Vec::new(),
                },
            ),
        )
        .with_command(
            CommandDescriptor::new("grant", "Grant a permission").with_arg_completions(permission_completions),
        )
        .with_command(
            CommandDescriptor::new("revoke", "Revoke a permission").with_arg_completions(permission_completions),
        )
        .with_command(CommandDescriptor::new("new-dao", "Create a new DAO"))
        .with_command(CommandDescriptor::new("new-token", "Create a new token"))
        .with_helper(HelperDescriptor::new("aragonEns", "Resolve an aragon ENS name"))
}

/// `grant <entity> <app> <role>`
fn permission_completions(ctx: &ArgCompletionContext<'_>) -> Vec<String> {
    match ctx.index {
        0 | 1 => {
            let mut values = ctx.bindings.visible_names(BindingSpace::User);
            values.push(ANY_ENTITY.to_string());
            values
        }
        2 => KNOWN_ROLES.iter().map(|r| r.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn connect_eager(ctx: EagerContext<'_>) -> EagerFuture<'_> {
    Box::pin(async move {
        let dao = ctx.node.args.first().ok_or_else(|| EagerError::MissingArgument {
            command: "connect".to_string(),
            name: "dao".to_string(),
        })?;
        let dao = resolve_argument(dao, ctx.bindings);

        if is_address(&dao) {
            return Ok(vec![Binding::user("$dao", dao)]);
        }

        let name = format!("{}{}", dao, ARAGON_ID_SUFFIX);
        debug!(name = %name, "resolving DAO name");
        match ctx.collaborators.provider.resolve_name(&name).await? {
            Some(address) => Ok(vec![Binding::user("$dao", address)]),
            None => Err(EagerError::Unresolved {
                command: "connect".to_string(),
                message: format!("{} does not resolve to an address", name),
            }),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::ast::types::AST;
    use crate::bindings::ScopedBindings;
    use crate::engine::errors::ExternalCallError;
    use crate::external::{Collaborators, MemoryContentResolver, OfflineProvider, Provider};

    const DAO_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

    /// Provider whose node is unreachable
    struct UnreachableProvider;

    #[async_trait]
    impl Provider for UnreachableProvider {
        async fn resolve_name(&self, _name: &str) -> Result<Option<String>, ExternalCallError> {
            Err(ExternalCallError::Provider {
                message: "connection refused".to_string(),
            })
        }
    }

    async fn run_connect(raw: &str) -> Result<Vec<Binding>, EagerError> {
        let provider = OfflineProvider::with_names([("mydao.aragonid.eth", DAO_ADDRESS)]);
        run_connect_with(Arc::new(provider), raw).await
    }

    async fn run_connect_with(provider: Arc<dyn Provider>, raw: &str) -> Result<Vec<Binding>, EagerError> {
        let collab = Collaborators::new(provider, Arc::new(MemoryContentResolver::new()));
        let node = AST::command(None, "connect", vec![AST::literal(raw)]);
        let store = ScopedBindings::new();
        let module = aragonos_module();
        let eager = module.command("connect").and_then(|c| c.eager.clone()).unwrap();
        eager(EagerContext {
            node: &node,
            bindings: &store,
            collaborators: &collab,
        })
        .await
    }

    #[tokio::test]
    async fn test_connect_resolves_name() {
        let out = run_connect("mydao").await.unwrap();
        assert_eq!(out, vec![Binding::user("$dao", DAO_ADDRESS)]);
    }

    #[tokio::test]
    async fn test_connect_accepts_address() {
        let addr = "0xAbCdEf0000000000000000000000000000000001";
        let out = run_connect(addr).await.unwrap();
        assert_eq!(out[0].as_text(), Some(addr));
    }

    #[tokio::test]
    async fn test_connect_unknown_name() {
        assert!(matches!(
            run_connect("nobody").await,
            Err(EagerError::Unresolved { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_provider_failure() {
        let err = run_connect_with(Arc::new(UnreachableProvider), "mydao").await.unwrap_err();
        assert_eq!(err.to_string(), "Provider error: connection refused");
        assert!(matches!(err, EagerError::External(ExternalCallError::Provider { .. })));
    }

    #[test]
    fn test_permission_completions() {
        let mut store = ScopedBindings::new();
        store.bind(Binding::user("$dao", DAO_ADDRESS));
        let complete = |index| {
            permission_completions(&ArgCompletionContext {
                index,
                args: &[],
                bindings: &store,
            })
        };
        assert_eq!(complete(0), vec!["$dao", ANY_ENTITY]);
        assert_eq!(complete(1), vec!["$dao", ANY_ENTITY]);
        assert!(complete(2).contains(&"CREATE_VOTES_ROLE".to_string()));
        assert!(complete(3).is_empty());
    }

    #[test]
    fn test_is_address() {
        assert!(is_address(DAO_ADDRESS));
        assert!(!is_address("0x1234"));
        assert!(!is_address("mydao"));
    }
}
