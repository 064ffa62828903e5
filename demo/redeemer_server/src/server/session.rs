use super::{SOCKET_READ_TIMEOUT, SOCKET_WRITE_TIMEOUT};
use crate::errors::InvalidInputError;
use common::{ClientHello, ClientMessage, ServerHello, ServerMessage, FAUCET_ESCROW};
use probtix::alloy_primitives::{Address, B256, U256};
use probtix::{
    Commitment, Error as TicketError, Ledger, MemoryLedger, SignedTicket, TicketDefaults,
};

use std::{collections::HashMap, error::Error, net};

/// Tickets accepted but not yet redeemed, with the commitment each one carries.
type HeldTickets = HashMap<B256, (SignedTicket, Commitment)>;

pub(crate) fn run_session(
    ledger: &MemoryLedger,
    receiver: Address,
    defaults: TicketDefaults,
    conn: net::TcpStream,
) -> Result<(), Box<dyn Error>> {
    conn.set_read_timeout(Some(SOCKET_READ_TIMEOUT))?;
    conn.set_write_timeout(Some(SOCKET_WRITE_TIMEOUT))?;

    let client_hello: ClientHello = serde_cbor::from_reader(&conn)?;
    let sender = client_hello.sender;
    if sender.is_zero() {
        return Err(InvalidInputError("sender address cannot be zero"))?;
    }

    // Demo faucet: fund the sender's escrow so its tickets can pay out.
    if ledger.query_deposit(sender).escrow.is_zero() {
        let amount = U256::from(FAUCET_ESCROW);
        ledger.mint(sender, amount);
        ledger.deposit_escrow(sender, amount, sender)?;
    }

    serde_cbor::to_writer(
        &conn,
        &ServerHello {
            receiver,
            defaults,
            escrow: ledger.query_deposit(sender).escrow,
            block_number: ledger.block_number(),
        },
    )?;

    let mut rng = rand::thread_rng();
    let mut pending_commitment: Option<Commitment> = None;
    let mut held = HeldTickets::new();

    loop {
        let message: ClientMessage = serde_cbor::from_reader(&conn)?;
        let reply = match message {
            ClientMessage::RequestCommit => {
                let commitment = Commitment::random(&mut rng);
                let commit = commitment.hash();
                pending_commitment = Some(commitment);
                ServerMessage::Commit { commit }
            }
            ClientMessage::Ticket(signed) => {
                let commitment = pending_commitment
                    .take()
                    .ok_or(InvalidInputError("ticket sent before requesting a commitment"))?;
                accept_ticket(ledger, sender, receiver, signed, commitment, &mut held)
            }
            ClientMessage::Reveal {
                ticket_hash,
                sender_random,
            } => {
                let (signed, commitment) = held
                    .remove(&ticket_hash)
                    .ok_or_else(|| InvalidInputError(format!("unknown ticket {}", ticket_hash)))?;
                match ledger.submit_redemption(&signed, &sender_random, commitment.value()) {
                    Ok(outcome) => ServerMessage::Redeemed {
                        ticket_hash,
                        outcome,
                    },
                    Err(e) => ServerMessage::RedemptionFailed {
                        ticket_hash,
                        reason: e.to_string(),
                    },
                }
            }
            ClientMessage::Goodbye => break,
        };
        serde_cbor::to_writer(&conn, &reply)?;
    }

    tracing::info!(
        %sender,
        unredeemed = held.len(),
        balance = %ledger.balance_of(receiver),
        "session closed"
    );
    Ok(())
}

fn accept_ticket(
    ledger: &MemoryLedger,
    sender: Address,
    receiver: Address,
    signed: SignedTicket,
    commitment: Commitment,
    held: &mut HeldTickets,
) -> ServerMessage {
    let checked = if signed.ticket.sender != sender {
        Err(TicketError::InvalidTicket("ticket is from another sender"))
    } else if signed.ticket.receiver != receiver {
        Err(TicketError::InvalidTicket("ticket is addressed to another receiver"))
    } else if signed.ticket.receiver_commit != commitment.hash() {
        Err(TicketError::InvalidTicket("ticket does not carry our commitment"))
    } else {
        signed
            .ticket
            .check_expiry(ledger.block_number())
            .and_then(|()| signed.verify_signature())
    };

    match checked {
        Ok(()) => {
            let ticket_hash = signed.hash();
            tracing::debug!(%ticket_hash, "ticket accepted");
            held.insert(ticket_hash, (signed, commitment));
            ServerMessage::TicketAccepted { ticket_hash }
        }
        Err(e) => ServerMessage::TicketRejected {
            reason: e.to_string(),
        },
    }
}
