use probtix::alloy_primitives::{Address, B256, U256};
use probtix::{RandomValue, RedemptionOutcome, SignedTicket, TicketBuilder, TicketDefaults};
use serde::{Deserialize, Serialize};

/// How much the redeemer's faucet deposits into each new sender's escrow.
pub const FAUCET_ESCROW: u64 = 1_000_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientHello {
    pub sender: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerHello {
    pub receiver: Address,
    pub defaults: TicketDefaults,
    pub escrow: U256,

    /// The ledger's block height when the session opened. Ticket expiry
    /// counts from here.
    pub block_number: u64,
}

impl ServerHello {
    /// Start a ticket from `sender` to this server using the advertised defaults.
    pub fn ticket_builder(&self, sender: Address) -> TicketBuilder {
        TicketBuilder::with_defaults(sender, self.receiver, &self.defaults, self.block_number)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Ask the redeemer for a fresh commitment to embed in the next ticket.
    RequestCommit,

    /// Pay with a signed ticket carrying the last commitment received.
    Ticket(SignedTicket),

    /// Reveal the sender's random value so the ticket can be redeemed.
    Reveal {
        ticket_hash: B256,
        sender_random: RandomValue,
    },

    Goodbye,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum ServerMessage {
    Commit { commit: B256 },
    TicketAccepted { ticket_hash: B256 },
    TicketRejected { reason: String },
    Redeemed {
        ticket_hash: B256,
        outcome: RedemptionOutcome,
    },
    RedemptionFailed { ticket_hash: B256, reason: String },
}

/// Install a `tracing` subscriber which respects `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_expire_relative_to_server_block() {
        let hello = ServerHello {
            receiver: Address::repeat_byte(0xee),
            defaults: TicketDefaults {
                face_value: U256::from(10u64),
                win_prob: U256::MAX,
                ticket_lifetime: 20,
            },
            escrow: U256::from(FAUCET_ESCROW),
            block_number: 1_000,
        };
        let ticket = hello
            .ticket_builder(Address::repeat_byte(0x5e))
            .sender_commit(B256::repeat_byte(1))
            .receiver_commit(B256::repeat_byte(2))
            .build()
            .unwrap();
        assert_eq!(ticket.expiration_block, 1_020);
        assert_eq!(ticket.receiver, hello.receiver);
        assert_eq!(ticket.face_value, U256::from(10u64));
    }
}
