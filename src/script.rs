//! Transaction scripts calling exported contract procedures.

use std::fmt::Write;

use miden_client::account::AccountId;
use miden_client::Felt;

use crate::config::ContractLibrary;

/// Registry procedure storing the payment token. Expects `[token_prefix, token_suffix]` on the
/// stack.
pub const SET_PAYMENT_TOKEN: &str = "set_payment_token";

// SCRIPTED CALL
// ================================================================================================

/// A transaction script invoking one exported procedure of a contract library.
///
/// Arguments are kept in the order the procedure declares them, first argument on top of the
/// stack. The rendered script pushes them in reverse so that they end up in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    library: ContractLibrary,
    procedure: String,
    args: Vec<Felt>,
}

impl ScriptedCall {
    pub fn new(library: ContractLibrary, procedure: impl Into<String>) -> Self {
        Self {
            library,
            procedure: procedure.into(),
            args: Vec::new(),
        }
    }

    /// Appends the next argument in declaration order.
    pub fn arg(mut self, value: Felt) -> Self {
        self.args.push(value);
        self
    }

    pub fn library(&self) -> &ContractLibrary {
        &self.library
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn args(&self) -> &[Felt] {
        &self.args
    }

    /// Arguments in the order they are pushed onto the stack.
    pub fn pushed_args(&self) -> impl Iterator<Item = Felt> + '_ {
        self.args.iter().rev().copied()
    }

    /// Renders the MASM source of the script.
    pub fn source(&self) -> String {
        let alias = self.library.alias();
        let mut source = format!("use.{}\nbegin\n", self.library.path);
        for value in self.pushed_args() {
            let _ = writeln!(source, "    push.{}", value.as_int());
        }
        let _ = writeln!(source, "    call.{alias}::{}", self.procedure);
        source.push_str("end\n");
        source
    }
}

// PAYMENT TOKEN
// ================================================================================================

/// A token identified by its faucet account, split into the two felts contracts store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenId(AccountId);

impl TokenId {
    pub fn new(faucet_id: AccountId) -> Self {
        Self(faucet_id)
    }

    pub fn account_id(&self) -> AccountId {
        self.0
    }

    pub fn prefix(&self) -> Felt {
        self.0.prefix().as_felt()
    }

    pub fn suffix(&self) -> Felt {
        self.0.suffix()
    }
}

/// Builds the call setting `token` as the registry's payment token.
pub fn set_payment_token(library: ContractLibrary, token: TokenId) -> ScriptedCall {
    ScriptedCall::new(library, SET_PAYMENT_TOKEN)
        .arg(token.prefix())
        .arg(token.suffix())
}

#[cfg(test)]
mod tests {
    use miden_client::account::AccountId;
    use miden_client::Felt;

    use super::{set_payment_token, ScriptedCall, TokenId};
    use crate::config::ContractLibrary;

    #[test]
    fn arguments_are_pushed_in_reverse_declaration_order() {
        let call = ScriptedCall::new(ContractLibrary::new("lib::math", ""), "add")
            .arg(Felt::new(1))
            .arg(Felt::new(2))
            .arg(Felt::new(3));

        assert_eq!(call.args(), &[Felt::new(1), Felt::new(2), Felt::new(3)]);
        assert_eq!(
            call.pushed_args().collect::<Vec<_>>(),
            vec![Felt::new(3), Felt::new(2), Felt::new(1)]
        );
        assert_eq!(
            call.source(),
            "use.lib::math\nbegin\n    push.3\n    push.2\n    push.1\n    call.math::add\nend\n"
        );
    }

    #[test]
    fn payment_token_script_pushes_suffix_before_prefix() {
        let token_id = AccountId::from_hex("0x508ade02b85a6220218f85140adf52").unwrap();
        let token = TokenId::new(token_id);
        let call = set_payment_token(ContractLibrary::registry(""), token);

        let prefix = token.prefix().as_int();
        let suffix = token.suffix().as_int();
        assert_eq!(call.args(), &[token.prefix(), token.suffix()]);

        let expected = format!(
            "use.external_contract::registry_contract\n\
             begin\n    push.{suffix}\n    push.{prefix}\n    call.registry_contract::set_payment_token\n\
             end\n"
        );
        assert_eq!(call.source(), expected);
    }

    #[test]
    fn token_prefix_matches_account_prefix() {
        let token_id = AccountId::from_hex("0x300d81593c4e7e2054c497c114b9e5").unwrap();
        let token = TokenId::new(token_id);
        assert_eq!(token.prefix(), token_id.prefix().as_felt());
        assert_eq!(token.suffix(), token_id.suffix());
        assert_eq!(token.account_id(), token_id);
    }
}
