use common::{ClientHello, ClientMessage, ServerHello, ServerMessage};
use probtix::alloy_primitives::B256;
use probtix::{Commitment, RedemptionOutcome, SignedTicket, SigningKey, TicketSigner};

use std::{env, error::Error, net};

const DEFAULT_TICKET_COUNT: u32 = 20;

fn run_client() -> Result<(), Box<dyn Error>> {
    common::init_logging();

    let redeemer_address = env::var("REDEEMER_ADDRESS")?;
    let ticket_count: u32 = match env::var("TICKET_COUNT") {
        Ok(n) => n.parse()?,
        Err(_) => DEFAULT_TICKET_COUNT,
    };

    let mut rng = rand::thread_rng();
    let key = match env::var("SENDER_SECRET_KEY") {
        Ok(hex) => SigningKey::from_hex(&hex)?,
        Err(_) => SigningKey::random(&mut rng),
    };
    tracing::info!(sender = %key.address(), "sender identity loaded");

    tracing::info!(%redeemer_address, "connecting");
    let conn = net::TcpStream::connect(&redeemer_address)?;

    serde_cbor::to_writer(
        &conn,
        &ClientHello {
            sender: key.address(),
        },
    )?;
    let server_hello: ServerHello = serde_cbor::from_reader(&conn)?;
    println!(
        "received ServerHello: {}",
        serde_json::to_string_pretty(&server_hello)?
    );

    let mut paid: Vec<(SignedTicket, Commitment)> = Vec::new();
    for nonce in 0..ticket_count {
        serde_cbor::to_writer(&conn, &ClientMessage::RequestCommit)?;
        let reply: ServerMessage = serde_cbor::from_reader(&conn)?;
        let receiver_commit = match reply {
            ServerMessage::Commit { commit } => commit,
            other => return Err(format!("expected a commitment, got {:?}", other).into()),
        };

        let sender_commitment = Commitment::random(&mut rng);
        let ticket = server_hello
            .ticket_builder(key.address())
            .sender_commit(sender_commitment.hash())
            .receiver_commit(receiver_commit)
            .sender_nonce(nonce)
            .build()?;
        let signed = SignedTicket::sign(ticket, &key)?;

        serde_cbor::to_writer(&conn, &ClientMessage::Ticket(signed.clone()))?;
        let reply: ServerMessage = serde_cbor::from_reader(&conn)?;
        match reply {
            ServerMessage::TicketAccepted { ticket_hash } => {
                tracing::debug!(%ticket_hash, nonce, "ticket accepted");
                paid.push((signed, sender_commitment));
            }
            ServerMessage::TicketRejected { reason } => {
                tracing::warn!(nonce, %reason, "ticket rejected");
            }
            other => return Err(format!("unexpected reply to ticket: {:?}", other).into()),
        }
    }

    let mut wins = 0usize;
    for (signed, sender_commitment) in &paid {
        let ticket_hash: B256 = signed.hash();
        serde_cbor::to_writer(
            &conn,
            &ClientMessage::Reveal {
                ticket_hash,
                sender_random: *sender_commitment.value(),
            },
        )?;
        let reply: ServerMessage = serde_cbor::from_reader(&conn)?;
        match reply {
            ServerMessage::Redeemed { outcome, .. } => {
                if let RedemptionOutcome::Won { amount } = outcome {
                    tracing::info!(%ticket_hash, %amount, "ticket won");
                    wins += 1;
                }
            }
            ServerMessage::RedemptionFailed { reason, .. } => {
                tracing::warn!(%ticket_hash, %reason, "redemption failed");
            }
            other => return Err(format!("unexpected reply to reveal: {:?}", other).into()),
        }
    }

    serde_cbor::to_writer(&conn, &ClientMessage::Goodbye)?;
    println!("{} of {} tickets won", wins, paid.len());
    Ok(())
}

fn main() {
    if let Err(e) = run_client() {
        eprintln!("fatal error: {}", e);
        std::process::exit(1);
    }
    println!("exiting OK");
}
