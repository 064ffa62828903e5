use probtix::alloy_primitives::U256;
use probtix::{
    commitment, consts, outcome, Client, Commitment, DepositState, Error, Ledger, LedgerParams,
    MemoryLedger, Redemption, RedemptionOutcome, SignedTicket, SigningKey, TicketDefaults,
    TicketSigner,
};

/*
    This demo illustrates a sender paying a receiver with probabilistic
    tickets against an in-memory ledger, then settling and withdrawing.
*/

#[test]
fn sender_pays_receiver_example() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::thread_rng();

    // The ledger enforces a 20 block delay before deposits can be withdrawn.
    // That delay gives receivers time to redeem any tickets they still hold
    // once the sender announces they are leaving.
    let ledger = MemoryLedger::new(LedgerParams {
        deposit_unlock_duration: 20,
        stake_unlock_duration: 10,
    });

    // Each party controls their own signing key. Only the sender's key
    // signs tickets; the receiver's address is where winnings are paid.
    let sender_key = SigningKey::random(&mut rng);
    let receiver_key = SigningKey::random(&mut rng);
    let sender_address = sender_key.address();
    let receiver_address = receiver_key.address();

    // Every ticket is worth 1000 units if it wins, and wins with
    // probability one half. Each ticket is therefore worth 500 units in
    // expectation. Tickets stay redeemable for 50 blocks.
    let face_value = U256::from(1000u64);
    let win_prob = outcome::win_prob_for_expected_value(U256::from(500u64), face_value);
    assert_eq!(outcome::expected_payout(face_value, win_prob), U256::from(500u64));
    let defaults = TicketDefaults {
        face_value,
        win_prob,
        ticket_lifetime: 50,
    };

    let sender = Client::with_defaults(&ledger, sender_key, defaults);
    let receiver = Client::with_defaults(&ledger, receiver_key, defaults);

    // The sender must lock up escrow before any ticket can pay out.
    ledger.mint(sender_address, U256::from(1_000_000u64));
    sender.deposit_escrow(U256::from(900_000u64))?;
    sender.deposit_penalty(U256::from(100_000u64))?;
    assert_eq!(sender.deposit().escrow, U256::from(900_000u64));
    assert_eq!(ledger.balance_of(sender_address), U256::ZERO);

    let mut tickets: Vec<(SignedTicket, Commitment, Commitment)> = Vec::new();
    for _ in 0..32 {
        // The receiver picks a secret random value and sends only its
        // commitment to the sender. The sender does the same, and embeds
        // both commitments in the ticket before signing it. Neither party
        // can predict the outcome without the other's secret.
        let receiver_commitment = Commitment::random(&mut rng);
        let sender_commitment = Commitment::random(&mut rng);

        let signed = sender.create_ticket(
            receiver_address,
            &sender_commitment,
            receiver_commitment.hash(),
        )?;

        // Before providing service in exchange for the ticket, the receiver
        // checks it is properly addressed, committed, and signed.
        receiver.accept_ticket(&signed, &receiver_commitment)?;

        tickets.push((signed, sender_commitment, receiver_commitment));
    }

    // Tickets from one sender never collide, thanks to the sender nonce.
    assert_eq!(tickets[0].0.ticket.sender_nonce, 0);
    assert_eq!(tickets[31].0.ticket.sender_nonce, 31);

    // Later the sender reveals their secrets, and the receiver can work out
    // which of their tickets won without touching the ledger.
    let mut expected_winnings = U256::ZERO;
    for (signed, sender_commitment, receiver_commitment) in &tickets {
        assert!(commitment::is_valid_reveal(
            sender_commitment.value(),
            &signed.ticket.sender_commit
        ));
        let wins = outcome::evaluate(
            signed,
            sender_commitment.value(),
            receiver_commitment.value(),
        )?;

        let redemption = receiver.redeem(
            signed,
            sender_commitment.value(),
            receiver_commitment.value(),
        )?;
        if wins {
            expected_winnings += face_value;
            assert_eq!(
                redemption,
                Redemption::Redeemed(RedemptionOutcome::Won { amount: face_value })
            );
        } else {
            assert_eq!(redemption, Redemption::Redeemed(RedemptionOutcome::Lost));
        }
        assert!(ledger.is_redeemed(&signed.hash()));
    }

    assert_eq!(ledger.balance_of(receiver_address), expected_winnings);
    assert_eq!(
        sender.deposit().escrow,
        U256::from(900_000u64) - expected_winnings
    );

    // Resubmitting a ticket is harmless. Nobody gets paid twice.
    let (signed, sender_commitment, receiver_commitment) = &tickets[0];
    assert_eq!(
        receiver.redeem(
            signed,
            sender_commitment.value(),
            receiver_commitment.value()
        )?,
        Redemption::AlreadyRedeemed
    );
    assert_eq!(
        ledger.submit_redemption(
            signed,
            sender_commitment.value(),
            receiver_commitment.value()
        ),
        Err(Error::TicketAlreadyRedeemed)
    );
    assert_eq!(ledger.balance_of(receiver_address), expected_winnings);

    // The sender decides to leave and asks to unlock the deposit.
    let unlock_at = sender.unlock_deposits()?;
    assert_eq!(unlock_at, 20);
    assert_eq!(
        sender.deposit().state(ledger.block_number()),
        DepositState::Unlocking { unlock_at: 20 }
    );

    // Until the unlock period completes, the deposit stays put.
    ledger.advance_blocks(19);
    assert_eq!(
        sender.withdraw(),
        Err(Error::UnlockPeriodNotComplete { unlock_at: 20 })
    );

    ledger.advance_blocks(1);
    let remaining = U256::from(1_000_000u64) - expected_winnings;
    assert_eq!(sender.withdraw()?, remaining);
    assert_eq!(ledger.balance_of(sender_address), remaining);
    assert_eq!(sender.deposit().total(), U256::ZERO);

    Ok(())
}

#[test]
fn cheating_sender_cannot_avoid_paying() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::thread_rng();
    let ledger = MemoryLedger::default();

    let sender_key = SigningKey::random(&mut rng);
    let receiver_key = SigningKey::random(&mut rng);
    let sender_address = sender_key.address();
    let receiver_address = receiver_key.address();

    let defaults = TicketDefaults {
        face_value: U256::from(10u64),
        win_prob: consts::ALWAYS_WIN,
        ticket_lifetime: 0,
    };
    let sender = Client::with_defaults(&ledger, sender_key, defaults);
    let receiver = Client::with_defaults(&ledger, receiver_key, defaults);

    ledger.mint(sender_address, U256::from(100u64));
    sender.deposit_escrow(U256::from(100u64))?;

    let receiver_commitment = Commitment::random(&mut rng);
    let sender_commitment = Commitment::random(&mut rng);
    let signed = sender.create_ticket(
        receiver_address,
        &sender_commitment,
        receiver_commitment.hash(),
    )?;

    // The sender can't lower the face value after signing.
    let mut tampered = signed.clone();
    tampered.ticket.face_value = U256::from(1u64);
    assert_eq!(
        ledger.submit_redemption(
            &tampered,
            sender_commitment.value(),
            receiver_commitment.value()
        ),
        Err(Error::InvalidSignature)
    );

    // Nor can a different random value be revealed in place of the committed one.
    let other_value = commitment::random_value(&mut rng);
    assert_eq!(
        ledger.submit_redemption(&signed, &other_value, receiver_commitment.value()),
        Err(Error::CommitmentMismatch(probtix::Party::Sender))
    );

    // Unlocking the deposit doesn't stop an honest redemption in the meantime.
    sender.unlock_deposits()?;
    assert_eq!(
        receiver.redeem(
            &signed,
            sender_commitment.value(),
            receiver_commitment.value()
        )?,
        Redemption::Redeemed(RedemptionOutcome::Won {
            amount: U256::from(10u64)
        })
    );
    assert_eq!(ledger.balance_of(receiver_address), U256::from(10u64));
    assert_eq!(sender.deposit().escrow, U256::from(90u64));

    Ok(())
}
