//! IB Port instruction encoding.
//!
//! The port program's wire format is fixed and must match bit for bit:
//!
//! ```text
//! [0]      u8   instruction index (1 = create transfer-unwrap request)
//! [1..9]   u64  amount in base units, little-endian
//! [9..]    raw  receiver address, destination-chain native width
//! ```
//!
//! The account list order and signer/writable flags below are the port's
//! calling convention. Any deviation makes the program reject or
//! misinterpret the instruction.

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::error::EncodingError;

/// Instruction index of the burn/unwrap request.
pub const UNWRAP_OPCODE: u8 = 1;

/// Seed of the port's program-derived address.
pub const PORT_PDA_SEED: &[u8] = b"ibport";

/// Serialize a transfer-unwrap request into the port's byte layout.
///
/// `receiver_width` is the destination chain's native address width; a
/// receiver of any other length is rejected rather than truncated or
/// padded.
pub fn encode_transfer_unwrap(
    amount: u64,
    receiver: &[u8],
    receiver_width: usize,
) -> Result<Vec<u8>, EncodingError> {
    if receiver.len() != receiver_width {
        return Err(EncodingError::ReceiverWidth {
            expected: receiver_width,
            actual: receiver.len(),
        });
    }

    let mut data = Vec::with_capacity(1 + 8 + receiver.len());
    data.push(UNWRAP_OPCODE);
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(receiver);
    Ok(data)
}

/// Derive the port's program-derived address from the fixed seed.
///
/// Pure and cheap; recomputed per call rather than cached.
pub fn port_program_address(port_program: &Pubkey) -> Result<Pubkey, EncodingError> {
    Pubkey::create_program_address(&[PORT_PDA_SEED], port_program)
        .map_err(|e| EncodingError::InvalidProgramAddress(e.to_string()))
}

/// The port's expected account list for an unwrap request, in calling
/// convention order:
///
/// 1. initializer          — signer, read-only
/// 2. SPL token program    — read-only
/// 3. token mint           — writable (burn reduces supply)
/// 4. spender token account — writable (tokens burned from here)
/// 5. port PDA             — read-only
pub fn unwrap_account_metas(
    initializer: &Pubkey,
    mint: &Pubkey,
    spender_account: &Pubkey,
    port_pda: &Pubkey,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(*initializer, true),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new(*mint, false),
        AccountMeta::new(*spender_account, false),
        AccountMeta::new_readonly(*port_pda, false),
    ]
}

/// Assemble the full unwrap instruction: encoded data plus the ordered
/// account list, with the PDA derived fresh.
pub fn build_unwrap_instruction(
    port_program: &Pubkey,
    initializer: &Pubkey,
    mint: &Pubkey,
    spender_account: &Pubkey,
    amount: u64,
    receiver: &[u8],
    receiver_width: usize,
) -> Result<Instruction, EncodingError> {
    let data = encode_transfer_unwrap(amount, receiver, receiver_width)?;
    let pda = port_program_address(port_program)?;
    let accounts = unwrap_account_metas(initializer, mint, spender_account, &pda);

    Ok(Instruction {
        program_id: *port_program,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let receiver = [0xabu8; 20];
        let data = encode_transfer_unwrap(5_000_000, &receiver, 20).unwrap();

        assert_eq!(data.len(), 1 + 8 + 20);
        assert_eq!(data[0], UNWRAP_OPCODE);
        assert_eq!(&data[1..9], &5_000_000u64.to_le_bytes());
        assert_eq!(&data[9..], &receiver);
    }

    #[test]
    fn test_encode_amount_roundtrip() {
        for amount in [0u64, 1, 123, u64::MAX - 1, u64::MAX] {
            let data = encode_transfer_unwrap(amount, &[0u8; 26], 26).unwrap();
            let decoded = u64::from_le_bytes(data[1..9].try_into().unwrap());
            assert_eq!(decoded, amount);
        }
    }

    #[test]
    fn test_encode_rejects_wrong_receiver_width() {
        let result = encode_transfer_unwrap(1, &[0u8; 19], 20);
        assert!(matches!(
            result,
            Err(EncodingError::ReceiverWidth {
                expected: 20,
                actual: 19
            })
        ));

        // too long is just as wrong as too short
        assert!(encode_transfer_unwrap(1, &[0u8; 21], 20).is_err());
    }

    #[test]
    fn test_account_metas_order_and_flags() {
        let initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let spender = Pubkey::new_unique();
        let pda = Pubkey::new_unique();

        let metas = unwrap_account_metas(&initializer, &mint, &spender, &pda);
        assert_eq!(metas.len(), 5);

        assert_eq!(metas[0].pubkey, initializer);
        assert!(metas[0].is_signer);
        assert!(!metas[0].is_writable);

        assert_eq!(metas[1].pubkey, spl_token::id());
        assert!(!metas[1].is_signer);
        assert!(!metas[1].is_writable);

        assert_eq!(metas[2].pubkey, mint);
        assert!(!metas[2].is_signer);
        assert!(metas[2].is_writable);

        assert_eq!(metas[3].pubkey, spender);
        assert!(!metas[3].is_signer);
        assert!(metas[3].is_writable);

        assert_eq!(metas[4].pubkey, pda);
        assert!(!metas[4].is_signer);
        assert!(!metas[4].is_writable);
    }

    #[test]
    fn test_pda_is_deterministic() {
        // find a program id whose fixed-seed PDA exists
        let port_program = loop {
            let candidate = Pubkey::new_unique();
            if port_program_address(&candidate).is_ok() {
                break candidate;
            }
        };

        let a = port_program_address(&port_program).unwrap();
        let b = port_program_address(&port_program).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_unwrap_instruction() {
        let port_program = loop {
            let candidate = Pubkey::new_unique();
            if port_program_address(&candidate).is_ok() {
                break candidate;
            }
        };

        let initializer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let spender = Pubkey::new_unique();

        let instruction = build_unwrap_instruction(
            &port_program,
            &initializer,
            &mint,
            &spender,
            123,
            &[7u8; 20],
            20,
        )
        .unwrap();

        assert_eq!(instruction.program_id, port_program);
        assert_eq!(instruction.accounts.len(), 5);
        assert_eq!(instruction.data[0], UNWRAP_OPCODE);
        assert_eq!(&instruction.data[1..9], &123u64.to_le_bytes());
    }
}
