use helpers::{compile_script, create_library};
use miden_client::account::AccountId;
use registry_workflows::script::{set_payment_token, ScriptedCall, TokenId};
use registry_workflows::ContractLibrary;

const REGISTRY_SOURCE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../contracts/registry/registry.masm"));

fn payment_token() -> TokenId {
    TokenId::new(AccountId::from_hex("0x508ade02b85a6220218f85140adf52").unwrap())
}

#[test]
fn registry_contract_assembles() {
    create_library(&ContractLibrary::registry(REGISTRY_SOURCE)).unwrap();
}

#[test]
fn set_payment_token_script_compiles_against_the_registry() {
    let call = set_payment_token(ContractLibrary::registry(REGISTRY_SOURCE), payment_token());

    compile_script(&call).unwrap();
}

#[test]
fn unknown_procedure_is_rejected_at_compile_time() {
    let call = ScriptedCall::new(ContractLibrary::registry(REGISTRY_SOURCE), "set_fee_token");

    let err = compile_script(&call).unwrap_err();
    assert_eq!(err.operation(), "compile transaction script");
}
