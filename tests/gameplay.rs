use brass_rs::board::{MapError, SpotRef};
use brass_rs::game::{
    BeerSource, BuildRequest, CubeSource, DevelopRequest, Game, GameError, GameEvent,
    NetworkRequest, SaleLine, SellRequest, coal_price, iron_price,
};
use brass_rs::reference::ReferenceData;
use brass_rs::types::{Card, Era, IndustryKind, MerchantKind, ResourceKind};
use brass_rs::view;
use smallvec::smallvec;

fn new_game(seed: u64) -> Game {
    let reference = ReferenceData::shared().expect("embedded data");
    Game::with_reference(&["Ada", "Ben"], seed, reference).expect("game")
}

fn spot(game: &Game, key: &str, slot: usize) -> SpotRef {
    SpotRef::new(game.state.map.find(key).expect(key), slot)
}

fn snapshot(game: &Game) -> serde_json::Value {
    serde_json::to_value(&game.state).unwrap()
}

fn open_merchant(game: &mut Game, key: &str) -> brass_rs::board::NodeId {
    let market = game.state.map.find(key).expect(key);
    game.state
        .map
        .market_mut(market)
        .unwrap()
        .add_merchant(MerchantKind::Wild, 0)
        .unwrap();
    market
}

fn sale(spot: SpotRef, beer: BeerSource) -> SellRequest {
    SellRequest {
        lines: vec![SaleLine {
            spot,
            beer: vec![beer],
        }],
        develop_bonus: None,
    }
}

#[test]
fn two_player_setup_deals_nine_with_one_face_down() {
    let game = new_game(3);
    for ledger in &game.state.players {
        assert_eq!(ledger.hand.len() + ledger.discard_pile.len(), 9);
        assert_eq!(ledger.discard_pile.len(), 1);
        assert_eq!(ledger.money, 17);
        assert_eq!(ledger.income_level().unwrap(), 0);
    }
    assert_eq!(game.state.bank.coal_market, 13);
    assert_eq!(game.state.bank.iron_market, 8);
    assert_eq!(game.state.bank.wild_locations, 2);
    assert_eq!(game.state.bank.deck_len(), 22);
}

#[test]
fn selling_to_a_merchant_flips_and_pays_the_bonus() {
    let mut game = new_game(4);
    let mill = spot(&game, "BIRM", 0);
    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    assert_eq!(game.state.players[0].money, 17 - 12);
    let oxford = open_merchant(&mut game, "OXFO");

    let outcome = game
        .state
        .sell(0, &sale(mill, BeerSource::Merchant { market: oxford, slot: 0 }))
        .unwrap();

    assert!(game.state.map.spot(mill).unwrap().flipped);
    assert_eq!(game.state.players[0].income, 10 + 5 + 2);
    assert_eq!(game.state.map.market(oxford).unwrap().beer[0], 0);
    assert!(outcome.events.contains(&GameEvent::Sold {
        player: 0,
        tiles: vec![brass_rs::TileId::new(IndustryKind::CottonMill, 1)],
        income: 5,
    }));
    assert!(matches!(
        game.state
            .sell(0, &sale(mill, BeerSource::Merchant { market: oxford, slot: 0 })),
        Err(GameError::Spot(_))
    ));
}

#[test]
fn develop_bonus_needs_a_target() {
    let mut game = new_game(5);
    let mill = spot(&game, "STOK", 0);
    game.state
        .build(1, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    let gloucester = open_merchant(&mut game, "GLOU");
    let mut request = sale(mill, BeerSource::Merchant { market: gloucester, slot: 0 });

    let before = snapshot(&game);
    assert!(matches!(
        game.state.sell(1, &request),
        Err(GameError::MissingDevelopTarget)
    ));
    assert_eq!(snapshot(&game), before);

    request.develop_bonus = Some(IndustryKind::Pottery);
    game.state.sell(1, &request).unwrap();
    assert_eq!(game.state.players[1].tiles_left(IndustryKind::Pottery), 4);
}

#[test]
fn brewery_beer_flips_the_brewery_for_its_owner() {
    let mut game = new_game(6);
    let brewery = spot(&game, "FBN", 0);
    game.state
        .build(
            0,
            &BuildRequest::new(IndustryKind::Brewery, brewery).with_iron([CubeSource::Market]),
        )
        .unwrap();
    assert_eq!(game.state.map.spot(brewery).unwrap().amount, 1);
    assert_eq!(game.state.players[0].money, 17 - 5 - iron_price(8));

    let mill = spot(&game, "LEEK", 0);
    game.state
        .build(1, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    game.state
        .sell(1, &sale(mill, BeerSource::Spot(brewery)))
        .unwrap();

    assert!(game.state.map.spot(brewery).unwrap().flipped);
    assert_eq!(game.state.players[0].income, 10 + 4);
    assert_eq!(game.state.players[1].income, 10 + 5);
}

#[test]
fn selling_a_rivals_tile_is_rejected() {
    let mut game = new_game(6);
    let mill = spot(&game, "BIRM", 0);
    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    let oxford = open_merchant(&mut game, "OXFO");
    assert!(matches!(
        game.state
            .sell(1, &sale(mill, BeerSource::Merchant { market: oxford, slot: 0 })),
        Err(GameError::NotOwner { player: 1, .. })
    ));
}

#[test]
fn a_tile_being_sold_cannot_supply_its_own_sale() {
    let mut game = new_game(14);
    let brewery = spot(&game, "FBN", 0);
    let mill = spot(&game, "BIRM", 0);
    game.state
        .build(
            0,
            &BuildRequest::new(IndustryKind::Brewery, brewery).with_iron([CubeSource::Market]),
        )
        .unwrap();
    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    let brewery_line = SaleLine {
        spot: brewery,
        beer: vec![],
    };
    let mill_line = SaleLine {
        spot: mill,
        beer: vec![BeerSource::Spot(brewery)],
    };

    let before = snapshot(&game);
    for lines in [
        vec![brewery_line.clone(), mill_line.clone()],
        vec![mill_line, brewery_line],
    ] {
        let request = SellRequest {
            lines,
            develop_bonus: None,
        };
        assert!(matches!(
            game.state.sell(0, &request),
            Err(GameError::SoldTileBeer(source)) if source == brewery
        ));
        assert_eq!(snapshot(&game), before);
    }
}

fn sell_through(game: &mut Game, key: &str) -> SpotRef {
    let mill = spot(game, "BIRM", 0);
    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    let market = open_merchant(game, key);
    game.state
        .sell(0, &sale(mill, BeerSource::Merchant { market, slot: 0 }))
        .unwrap();
    mill
}

#[test]
fn shrewsbury_points_land_in_the_canal_merchant_category() {
    let mut game = new_game(15);
    sell_through(&mut game, "SHRE");
    assert_eq!(game.state.players[0].vps[0], 4);
    assert_eq!(game.state.players[0].era_points(Era::Rail), 0);
}

#[test]
fn shrewsbury_points_land_in_the_rail_merchant_category() {
    let mut game = new_game(16);
    game.state.era = Era::Rail;
    sell_through(&mut game, "SHRE");
    assert_eq!(game.state.players[0].vps[4], 4);
    assert_eq!(game.state.players[0].era_points(Era::Canal), 0);
}

#[test]
fn warrington_pays_five_in_a_three_player_game() {
    let reference = ReferenceData::shared().expect("embedded data");
    let mut game = Game::with_reference(&["Ada", "Ben", "Cy"], 17, reference).expect("game");
    sell_through(&mut game, "WARR");
    assert_eq!(game.state.players[0].money, 17 - 12 + 5);
    assert_eq!(game.state.players[0].total_points(), 0);
}

#[test]
fn develop_pops_lowest_tiles_and_buys_iron() {
    let mut game = new_game(7);
    let single = DevelopRequest {
        industries: smallvec![IndustryKind::Ironworks],
        iron: vec![CubeSource::Market],
    };
    game.state.develop(0, &single).unwrap();
    assert_eq!(
        game.state.players[0].next_tile(IndustryKind::Ironworks),
        Some(brass_rs::TileId::new(IndustryKind::Ironworks, 2))
    );
    assert_eq!(game.state.players[0].money, 17 - iron_price(8));

    let pottery = DevelopRequest {
        industries: smallvec![IndustryKind::Pottery],
        iron: vec![CubeSource::Market],
    };
    assert!(matches!(
        game.state.develop(0, &pottery),
        Err(GameError::NotDevelopable(_))
    ));

    let double = DevelopRequest {
        industries: smallvec![IndustryKind::CoalMine, IndustryKind::CoalMine],
        iron: vec![CubeSource::Market, CubeSource::Market],
    };
    game.state.develop(1, &double).unwrap();
    assert_eq!(game.state.players[1].tiles_left(IndustryKind::CoalMine), 5);
    assert_eq!(game.state.players[1].money, 17 - iron_price(7) - iron_price(6));
    assert_eq!(game.state.bank.iron_market, 5);
}

#[test]
fn scouting_draws_on_the_shared_wild_supply() {
    let mut game = new_game(8);
    game.state.scout(0, [None, None]).unwrap();
    let ledger = &game.state.players[0];
    assert_eq!(ledger.hand.len(), 8);
    assert_eq!(ledger.discard_pile.len(), 3);
    assert!(ledger.has_card(&Card::WildLocation));
    assert!(ledger.has_card(&Card::WildIndustry));

    game.state.scout(1, [None, None]).unwrap();
    assert_eq!(game.state.bank.wild_industries, 0);
    assert!(matches!(
        game.state.scout(0, [None, None]),
        Err(GameError::NoWildsLeft)
    ));

    game.state.discard(0, &Card::WildLocation).unwrap();
    assert_eq!(game.state.bank.wild_locations, 1);
    assert_eq!(game.state.players[0].discard_pile.len(), 3);
}

#[test]
fn drawing_past_the_deck_is_reported() {
    let mut game = new_game(9);
    game.state.draw_cards(1, 22).unwrap();
    assert_eq!(game.state.players[1].hand.len(), 30);
    assert!(matches!(
        game.state.draw_cards(0, 1),
        Err(GameError::DeckExhausted {
            requested: 1,
            remaining: 0
        })
    ));
}

#[test]
fn round_end_orders_by_spend_and_collects_debt() {
    let mut game = new_game(10);
    game.state.turn_order = vec![1, 0];
    let mill = spot(&game, "STOK", 0);
    let birm = game.state.map.find("BIRM").unwrap();
    let cove = game.state.map.find("COVE").unwrap();
    game.state
        .build(1, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    game.state.network(0, &NetworkRequest::single((birm, cove))).unwrap();
    game.state.players[1].money = 2;
    game.state.players[1].income = 5;

    let debts = game.end_of_round().unwrap();
    assert_eq!(game.state.round, 2);
    assert_eq!(game.state.turn_order, vec![0, 1]);
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].player, 1);
    assert_eq!(debts[0].amount, 3);
    assert_eq!(game.state.players[1].money, 0);
    assert_eq!(game.state.players[1].spent_this_turn, 0);

    let remaining = game.state.pay_debt(1, debts[0].amount, mill).unwrap();
    assert_eq!(remaining, 3 - 6);
    assert_eq!(game.state.players[1].money, 3);
    assert!(game.state.map.spot(mill).unwrap().is_empty());
}

#[test]
fn forfeited_debt_never_sinks_an_era_below_zero() {
    let mut game = new_game(11);
    game.state.forfeit_debt(0, 4).unwrap();
    assert_eq!(game.state.players[0].era_points(Era::Canal), 0);

    game.state.players[1].increase_vps(5, 2);
    game.state.forfeit_debt(1, 3).unwrap();
    assert_eq!(game.state.players[1].vps[3], -3);
    assert_eq!(game.state.players[1].total_points(), 2);
}

#[test]
fn debts_must_be_positive() {
    let mut game = new_game(18);
    let mill = spot(&game, "STOK", 0);
    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();

    let before = snapshot(&game);
    assert!(matches!(
        game.state.pay_debt(0, 0, mill),
        Err(GameError::InvalidDebt(0))
    ));
    assert!(matches!(
        game.state.forfeit_debt(0, -5),
        Err(GameError::InvalidDebt(-5))
    ));
    assert_eq!(snapshot(&game), before);
}

#[test]
fn preview_leaves_the_counters_alone() {
    let mut game = new_game(12);
    let birm = game.state.map.find("BIRM").unwrap();
    let oxfo = game.state.map.find("OXFO").unwrap();
    game.state.network(1, &NetworkRequest::single((birm, oxfo))).unwrap();

    let before = snapshot(&game);
    let preview = view::projected_scoreboard(&game.state);
    assert_eq!(snapshot(&game), before);
    assert_eq!(preview.rows[0].player, 1);
    assert_eq!(preview.rows[0].points[1], 2);
    assert_eq!(view::scoreboard(&game.state).rows[0].total, 0);
}

#[test]
fn canal_era_closes_cleanly() {
    let mut game = new_game(13);
    let mill = spot(&game, "BIRM", 0);
    let mine = spot(&game, "DUDL", 0);
    let birm = mill.location;
    let oxfo = game.state.map.find("OXFO").unwrap();
    let kidd = game.state.map.find("KIDD").unwrap();
    let worc = game.state.map.find("WORC").unwrap();

    game.state
        .build(0, &BuildRequest::new(IndustryKind::CottonMill, mill))
        .unwrap();
    game.state
        .develop(
            1,
            &DevelopRequest {
                industries: smallvec![IndustryKind::CoalMine],
                iron: vec![CubeSource::Market],
            },
        )
        .unwrap();
    game.state
        .build(1, &BuildRequest::new(IndustryKind::CoalMine, mine))
        .unwrap();
    game.state.network(0, &NetworkRequest::single((birm, oxfo))).unwrap();
    let placed = game.state.network(1, &NetworkRequest::single((worc, kidd))).unwrap();
    assert!(matches!(
        &placed.events[0],
        GameEvent::LinksBuilt { edges, .. } if edges.len() == 3
    ));
    let oxford = open_merchant(&mut game, "OXFO");
    game.state
        .sell(0, &sale(mill, BeerSource::Merchant { market: oxford, slot: 0 }))
        .unwrap();
    let deck_before = game.state.bank.deck_len();

    game.end_of_canal().unwrap();

    let state = &game.state;
    assert_eq!(state.era, Era::Rail);
    assert_eq!(state.round, 1);
    assert!(state.map.links().all(|link| link.owner.is_none()));
    assert!(state.map.spot(mill).unwrap().is_empty());
    assert_eq!(
        state.map.spot(mine).unwrap().industry,
        Some(brass_rs::TileId::new(IndustryKind::CoalMine, 2))
    );
    for (_, market) in state.map.markets() {
        for (merchant, beer) in market.merchants.iter().zip(&market.beer) {
            assert_eq!(*beer, u8::from(merchant.is_some()));
        }
    }
    // Oxford link: market 2 + flipped mill 1; mill itself 5.
    assert_eq!(state.players[0].vps[1], 3);
    assert_eq!(state.players[0].vps[2], 5);
    assert_eq!(state.players[1].vps[1], 0);
    for ledger in &state.players {
        assert_eq!(ledger.hand.len(), 16);
        assert!(ledger.discard_pile.is_empty());
        assert_eq!(ledger.link_tiles, 14);
    }
    assert_eq!(state.bank.deck_len(), deck_before + 2 - 16);
    assert!(matches!(game.end_of_canal(), Err(GameError::WrongEra(Era::Rail))));
}

#[test]
fn rail_double_network_uses_coal_and_beer() {
    let mut game = new_game(14);
    game.end_of_canal().unwrap();
    let brewery = spot(&game, "FBN", 0);
    game.state
        .build(
            0,
            &BuildRequest::new(IndustryKind::Brewery, brewery).with_iron([CubeSource::Market]),
        )
        .unwrap();
    assert_eq!(game.state.map.spot(brewery).unwrap().amount, 2);

    let birm = game.state.map.find("BIRM").unwrap();
    let cove = game.state.map.find("COVE").unwrap();
    let oxfo = game.state.map.find("OXFO").unwrap();
    let request = NetworkRequest::double((birm, cove), (birm, oxfo))
        .with_coal([CubeSource::Market, CubeSource::Market]);
    assert!(matches!(
        game.state.network(0, &request),
        Err(GameError::CubeCount { resource: ResourceKind::Beer, .. })
    ));

    game.state.network(0, &request.with_beer(brewery)).unwrap();
    let ledger = &game.state.players[0];
    let network_cost = 15 + coal_price(13) + coal_price(12);
    assert_eq!(ledger.spent_this_turn, 5 + iron_price(8) + network_cost);
    assert_eq!(ledger.money, 17 - ledger.spent_this_turn);
    assert_eq!(ledger.link_tiles, 12);
    assert_eq!(game.state.map.spot(brewery).unwrap().amount, 1);
    assert!(matches!(
        game.state.network(1, &NetworkRequest::single((cove, birm)).with_coal([CubeSource::Market])),
        Err(GameError::Map(MapError::LinkOwned(_)))
    ));
}

#[test]
fn game_end_scores_rail_and_stops() {
    let mut game = new_game(15);
    game.end_of_canal().unwrap();
    let birm = game.state.map.find("BIRM").unwrap();
    let oxfo = game.state.map.find("OXFO").unwrap();
    game.state
        .network(1, &NetworkRequest::single((birm, oxfo)).with_coal([CubeSource::Market]))
        .unwrap();
    let outcome = game.end_of_game().unwrap();
    assert!(outcome.done);
    assert_eq!(game.state.era, Era::End);
    assert_eq!(game.state.players[1].vps[5], 2);
    assert!(matches!(game.state.loan(0), Err(GameError::GameOver)));
}
