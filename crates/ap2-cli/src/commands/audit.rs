use anyhow::{bail, Result};
use ap2_audit::{verify_hash_chain, VerifyResult};

pub fn verify(path: &str) -> Result<()> {
    match verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("audit_chain=VALID lines={lines}");
            Ok(())
        }
        VerifyResult::Unchained { lines } => {
            println!("audit_chain=UNCHAINED lines={lines}");
            bail!("AUDIT_CHAIN_UNCHAINED: {lines} entries carry no hashes; content cannot be verified");
        }
        VerifyResult::Broken { line, reason } => {
            println!("audit_chain=BROKEN line={line}");
            bail!("AUDIT_CHAIN_BROKEN at line {line}: {reason}");
        }
    }
}
