//! Candy machine v1 account layout and mint instructions

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::DateTime;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_instruction, system_program, sysvar,
};
use spl_token::solana_program::program_pack::Pack;

use crate::errors::{MintError, MintResult};
use crate::types::{ProgramCounters, ProgramHandle, ProgramState};

/// Metaplex token metadata program
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Size of an SPL mint account
pub const MINT_ACCOUNT_LEN: usize = spl_token::state::Mint::LEN;

/// First 8 bytes of `sha256("{namespace}:{name}")`
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Candy machine account body, after the Anchor discriminator
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CandyMachineAccount {
    pub authority: Pubkey,
    pub wallet: Pubkey,
    pub token_mint: Option<Pubkey>,
    pub config: Pubkey,
    pub uuid: String,
    pub price: u64,
    pub items_available: u64,
    pub go_live_date: Option<i64>,
    pub items_redeemed: u64,
    pub bump: u8,
}

impl CandyMachineAccount {
    /// Decode raw account data. Trailing bytes past the struct are ignored.
    pub fn decode(data: &[u8]) -> MintResult<Self> {
        let Some((discriminator, mut body)) = data.split_first_chunk::<8>() else {
            return Err(MintError::Decode(format!(
                "account data too short: {} bytes",
                data.len()
            )));
        };
        if *discriminator != anchor_discriminator("account", "CandyMachine") {
            return Err(MintError::Decode(
                "account is not a candy machine".to_string(),
            ));
        }

        Self::deserialize(&mut body).map_err(|e| MintError::Decode(e.to_string()))
    }

    pub fn into_program_state(self, program_id: Pubkey, candy_machine: Pubkey) -> ProgramState {
        ProgramState {
            counters: ProgramCounters::from_totals(self.items_available, self.items_redeemed),
            start_date: self
                .go_live_date
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            handle: ProgramHandle {
                program_id,
                candy_machine,
                config: self.config,
                authority: self.authority,
                wallet: self.wallet,
                price_lamports: self.price,
                token_mint: self.token_mint,
            },
        }
    }
}

/// Candy machine program error descriptions, by custom error code
pub fn error_description(code: u32) -> Option<&'static str> {
    let msg = match code {
        300 => "Account does not have correct owner!",
        301 => "Account is not initialized!",
        302 => "Mint Mismatch!",
        303 => "Index greater than length!",
        304 => "Config must have atleast one creator!",
        305 => "Numerical overflow error!",
        306 => "Can only provide up to 4 creators to candy machine (because candy machine is one)!",
        307 => "Uuid must be exactly of 6 length",
        308 => "Not enough tokens to pay for this minting",
        309 => "Not enough SOL to pay for this minting",
        310 => "Token transfer failed",
        311 => "Candy machine is empty!",
        312 => "Candy machine is not live yet!",
        313 => "Number of config lines must be at least number of items available",
        _ => return None,
    };
    Some(msg)
}

/// Attach the program's description to a structured error that lacks one
pub fn describe_error(err: MintError) -> MintError {
    match err {
        MintError::Program { code, msg: None } => MintError::Program {
            code,
            msg: error_description(code).map(str::to_string),
        },
        other => other,
    }
}

pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn master_edition_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            b"edition",
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

/// Instructions minting one item into a fresh mint owned by `payer`:
/// create and initialize the mint, create the payer's token account,
/// mint one token into it, then `mint_nft`.
pub fn mint_instructions(
    program: &ProgramHandle,
    payer: &Pubkey,
    treasury: &Pubkey,
    mint: &Pubkey,
    mint_rent_lamports: u64,
) -> MintResult<Vec<Instruction>> {
    if program.token_mint.is_some() {
        return Err(MintError::Configuration(
            "SPL-token priced candy machines are not supported".to_string(),
        ));
    }

    let token_account = spl_associated_token_account::get_associated_token_address(payer, mint);

    let initialize_mint =
        spl_token::instruction::initialize_mint(&spl_token::id(), mint, payer, Some(payer), 0)
            .map_err(|e| MintError::Configuration(format!("initialize_mint: {}", e)))?;

    let mint_to =
        spl_token::instruction::mint_to(&spl_token::id(), mint, &token_account, payer, &[], 1)
            .map_err(|e| MintError::Configuration(format!("mint_to: {}", e)))?;

    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            mint_rent_lamports,
            MINT_ACCOUNT_LEN as u64,
            &spl_token::id(),
        ),
        initialize_mint,
        spl_associated_token_account::instruction::create_associated_token_account(
            payer,
            payer,
            mint,
            &spl_token::id(),
        ),
        mint_to,
        mint_nft_instruction(program, payer, treasury, mint),
    ])
}

/// The candy machine `mint_nft` instruction
pub fn mint_nft_instruction(
    program: &ProgramHandle,
    payer: &Pubkey,
    treasury: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: program.program_id,
        accounts: vec![
            AccountMeta::new_readonly(program.config, false),
            AccountMeta::new(program.candy_machine, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new(*treasury, false),
            AccountMeta::new(metadata_address(mint), false),
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(*payer, true),
            AccountMeta::new_readonly(*payer, true),
            AccountMeta::new(master_edition_address(mint), false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
        ],
        data: anchor_discriminator("global", "mint_nft").to_vec(),
    }
}
