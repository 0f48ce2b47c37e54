use postflop_dcfr::*;

fn main() {
    // ranges of OOP (player 1) and IP (player 2) in string format
    // see the documentation of `Range` for more details about the format
    let oop_range: Range = "66+,AQs+,AKo".parse().unwrap();
    let ip_range: Range = "66+,AQs+,AKo".parse().unwrap();

    let board = board_from_str("Td 9d 6h").unwrap();

    // bet sizes are fractions of the post-call pot, per street
    let bet_sizing = BetSizingConfig {
        flop: StreetSizing::try_from(("50%, 100%", "100%")).unwrap(),
        turn: StreetSizing::try_from(("66%, 100%", "100%")).unwrap(),
        river: StreetSizing::try_from(("66%, 100%", "100%")).unwrap(),
    };

    let config = TreeConfig {
        in_position_player: 2,
        starting_pot: 200,
        starting_stack: 400,
        minimum_bet: 2,
        all_in_threshold: 0.67,
        bet_sizing,
        raise_cap: 2,
        remove_donk_bets: false,
        use_isomorphism: true,
        compression: true,
    };

    // build the game tree
    let range_manager = RangeManager::new(&oop_range, &ip_range, &board).unwrap();
    let tree = TreeBuilder::new(&range_manager, board, config)
        .unwrap()
        .build()
        .unwrap();
    println!(
        "Tree built: {} action nodes, {} terminals",
        tree.statistics().total_action_nodes(),
        tree.statistics().terminal_nodes
    );

    // solve the game
    let mut trainer = Trainer::new(range_manager, tree);
    let settings = SolveSettings {
        max_iterations: 100,
        target_exploitability_pct: 1.0, // stop at 1.0% of the pot
        print_progress: true,
        ..Default::default()
    };
    let exploitability = trainer.train(&settings, |_, _, _| {}).unwrap();
    println!("Exploitability: {exploitability:.2}% of the pot");

    // read the solved strategy at the root
    if let Node::Action(root) = trainer.game_tree().root() {
        let strategy = root.average_strategy();
        let num_hands = trainer.range_manager().num_hands(root.player());
        println!("Root actions: {:?}", root.actions());
        println!(
            "First hand's strategy: {:?}",
            (0..root.num_actions())
                .map(|a| strategy[a * num_hands])
                .collect::<Vec<_>>()
        );
    }
}
