//! In-process reference store.
//!
//! Serializability is validated optimistically. A transaction remembers the
//! version of every row it point-reads (absent rows read as version 0) and of
//! every table it scans. Each new read re-checks everything read so far and
//! raises `Aborted` if any version moved, so the values a transaction sees
//! always come from a single committed state. Commit takes the store mutex
//! and runs the same check once more. Buffered mutations are then
//! checked against key preconditions as a whole before the first one is
//! applied, so a failed commit leaves the tables untouched.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use gamecore_types::{
    Clock, EconomyError, Game, GameId, GameItem, GameItemId, LedgerEntry, LedgerPosting, OrderId,
    OrderState, Player, PlayerId, PlayerItem, PlayerItemId, Result, SystemClock, TradeOrder,
};
use rust_decimal::Decimal;

use crate::txn::{ReadTxn, Store, StoreTxn, WriteTxn};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Table {
    Players,
    GameItems,
    PlayerItems,
    TradeOrders,
    Games,
    Ledger,
}

impl Table {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Player(PlayerId),
    GameItem(GameItemId),
    PlayerItem(PlayerId, PlayerItemId),
    TradeOrder(OrderId),
    Game(GameId),
}

impl RowKey {
    fn table(self) -> Table {
        match self {
            Self::Player(_) => Table::Players,
            Self::GameItem(_) => Table::GameItems,
            Self::PlayerItem(..) => Table::PlayerItems,
            Self::TradeOrder(_) => Table::TradeOrders,
            Self::Game(_) => Table::Games,
        }
    }
}

#[derive(Debug, Clone)]
struct Row<T> {
    /// Commit sequence number of the last write.
    version: u64,
    value: T,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    players: BTreeMap<PlayerId, Row<Player>>,
    game_items: BTreeMap<GameItemId, Row<GameItem>>,
    player_items: BTreeMap<(PlayerId, PlayerItemId), Row<PlayerItem>>,
    trade_orders: BTreeMap<OrderId, Row<TradeOrder>>,
    games: BTreeMap<GameId, Row<Game>>,
    ledger: Vec<LedgerEntry>,
    table_versions: [u64; Table::COUNT],
    commit_seq: u64,
}

fn version_of<K: Ord, V>(map: &BTreeMap<K, Row<V>>, key: &K) -> u64 {
    map.get(key).map_or(0, |row| row.version)
}

fn value_of<K: Ord, V: Clone>(map: &BTreeMap<K, Row<V>>, key: &K) -> Option<V> {
    map.get(key).map(|row| row.value.clone())
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl Tables {
    fn row_version(&self, key: RowKey) -> u64 {
        match key {
            RowKey::Player(id) => version_of(&self.players, &id),
            RowKey::GameItem(id) => version_of(&self.game_items, &id),
            RowKey::PlayerItem(owner, id) => version_of(&self.player_items, &(owner, id)),
            RowKey::TradeOrder(id) => version_of(&self.trade_orders, &id),
            RowKey::Game(id) => version_of(&self.games, &id),
        }
    }

    fn row_exists(&self, key: RowKey) -> bool {
        self.row_version(key) != 0
    }

    fn table_version(&self, table: Table) -> u64 {
        self.table_versions[table.index()]
    }

    // ---- queries shared by transactions and snapshots ----

    fn player(&self, id: PlayerId) -> Option<Player> {
        value_of(&self.players, &id)
    }

    fn unassigned_players(&self, limit: usize) -> Vec<Player> {
        self.players
            .values()
            .map(|row| &row.value)
            .filter(|p| p.is_available())
            .take(limit)
            .cloned()
            .collect()
    }

    fn funded_players_in_game(&self, exclude: PlayerId, min_balance: Decimal, limit: usize) -> Vec<Player> {
        self.players
            .values()
            .map(|row| &row.value)
            .filter(|p| p.current_game.is_some() && p.id != exclude && p.account_balance > min_balance)
            .take(limit)
            .cloned()
            .collect()
    }

    fn game_item(&self, id: GameItemId) -> Option<GameItem> {
        value_of(&self.game_items, &id)
    }

    fn player_item(&self, owner: PlayerId, id: PlayerItemId) -> Option<PlayerItem> {
        value_of(&self.player_items, &(owner, id))
    }

    fn player_items(&self, owner: PlayerId) -> Vec<PlayerItem> {
        self.player_items
            .range((owner, PlayerItemId::from_bytes([0; 16]))..=(owner, PlayerItemId::from_bytes([0xff; 16])))
            .map(|(_, row)| row.value.clone())
            .collect()
    }

    fn listable_items(&self, limit: usize) -> Vec<PlayerItem> {
        self.player_items
            .values()
            .map(|row| &row.value)
            .filter(|pi| pi.visible && pi.expires_time.is_none())
            .filter(|pi| {
                self.players
                    .get(&pi.owner)
                    .is_some_and(|row| row.value.current_game.is_some())
            })
            .take(limit)
            .cloned()
            .collect()
    }

    fn trade_order(&self, id: OrderId) -> Option<TradeOrder> {
        value_of(&self.trade_orders, &id)
    }

    fn open_orders(&self, now: DateTime<Utc>, limit: usize) -> Vec<TradeOrder> {
        let mut open: Vec<TradeOrder> = self
            .trade_orders
            .values()
            .map(|row| &row.value)
            .filter(|o| o.is_open_at(now))
            .cloned()
            .collect();
        newest_first(&mut open, |o| o.created);
        open.truncate(limit);
        open
    }

    fn due_orders(&self, now: DateTime<Utc>, limit: usize) -> Vec<TradeOrder> {
        let mut due: Vec<TradeOrder> = self
            .trade_orders
            .values()
            .map(|row| &row.value)
            .filter(|o| o.state == OrderState::Active && o.is_past_expiry(now))
            .cloned()
            .collect();
        due.sort_by_key(|o| o.expires);
        due.truncate(limit);
        due
    }

    fn game(&self, id: GameId) -> Option<Game> {
        value_of(&self.games, &id)
    }

    fn open_games(&self, limit: usize) -> Vec<Game> {
        let mut open: Vec<Game> = self
            .games
            .values()
            .map(|row| &row.value)
            .filter(|g| g.is_open())
            .cloned()
            .collect();
        newest_first(&mut open, |g| g.created);
        open.truncate(limit);
        open
    }

    fn ledger_entries(&self, player: PlayerId) -> Vec<LedgerEntry> {
        self.ledger
            .iter()
            .filter(|e| e.player == player)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Mutation {
    InsertPlayer(Player),
    UpdatePlayer(Player),
    InsertGameItem(GameItem),
    InsertPlayerItem(PlayerItem),
    UpdatePlayerItem(PlayerItem),
    DeletePlayerItem(PlayerId, PlayerItemId),
    InsertTradeOrder(TradeOrder),
    UpdateTradeOrder(TradeOrder),
    InsertGame(Game),
    UpdateGame(Game),
    AppendLedger(LedgerPosting),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Insert,
    Update,
    Delete,
}

impl Mutation {
    /// Target row and kind of write. `None` for append-only ledger postings.
    fn target(&self) -> Option<(RowKey, Op)> {
        Some(match self {
            Self::InsertPlayer(p) => (RowKey::Player(p.id), Op::Insert),
            Self::UpdatePlayer(p) => (RowKey::Player(p.id), Op::Update),
            Self::InsertGameItem(i) => (RowKey::GameItem(i.id), Op::Insert),
            Self::InsertPlayerItem(pi) => (RowKey::PlayerItem(pi.owner, pi.id), Op::Insert),
            Self::UpdatePlayerItem(pi) => (RowKey::PlayerItem(pi.owner, pi.id), Op::Update),
            Self::DeletePlayerItem(owner, id) => (RowKey::PlayerItem(*owner, *id), Op::Delete),
            Self::InsertTradeOrder(o) => (RowKey::TradeOrder(o.id), Op::Insert),
            Self::UpdateTradeOrder(o) => (RowKey::TradeOrder(o.id), Op::Update),
            Self::InsertGame(g) => (RowKey::Game(g.id), Op::Insert),
            Self::UpdateGame(g) => (RowKey::Game(g.id), Op::Update),
            Self::AppendLedger(_) => return None,
        })
    }

    fn table(&self) -> Table {
        self.target().map_or(Table::Ledger, |(key, _)| key.table())
    }
}

/// Check insert/update preconditions for the whole batch, in order.
fn check_preconditions(tables: &Tables, mutations: &[Mutation]) -> Result<()> {
    let mut overlay: HashMap<RowKey, bool> = HashMap::new();
    for mutation in mutations {
        let Some((key, op)) = mutation.target() else {
            continue;
        };
        let exists = overlay
            .get(&key)
            .copied()
            .unwrap_or_else(|| tables.row_exists(key));
        match op {
            Op::Insert if exists => {
                return Err(EconomyError::Storage(format!("duplicate key on insert: {key:?}")));
            }
            Op::Update if !exists => {
                return Err(EconomyError::Storage(format!("row not found on update: {key:?}")));
            }
            Op::Insert | Op::Update => {
                overlay.insert(key, true);
            }
            Op::Delete => {
                overlay.insert(key, false);
            }
        }
    }
    Ok(())
}

fn apply(tables: &mut Tables, mutation: Mutation, seq: u64, now: DateTime<Utc>) {
    let table = mutation.table();
    match mutation {
        Mutation::InsertPlayer(mut p) | Mutation::UpdatePlayer(mut p) => {
            p.updated = Some(now);
            tables.players.insert(p.id, Row { version: seq, value: p });
        }
        Mutation::InsertGameItem(i) => {
            tables.game_items.insert(i.id, Row { version: seq, value: i });
        }
        Mutation::InsertPlayerItem(pi) | Mutation::UpdatePlayerItem(pi) => {
            tables
                .player_items
                .insert((pi.owner, pi.id), Row { version: seq, value: pi });
        }
        Mutation::DeletePlayerItem(owner, id) => {
            tables.player_items.remove(&(owner, id));
        }
        Mutation::InsertTradeOrder(o) | Mutation::UpdateTradeOrder(o) => {
            tables.trade_orders.insert(o.id, Row { version: seq, value: o });
        }
        Mutation::InsertGame(g) | Mutation::UpdateGame(g) => {
            tables.games.insert(g.id, Row { version: seq, value: g });
        }
        Mutation::AppendLedger(posting) => {
            tables.ledger.push(LedgerEntry::from_posting(posting, now));
        }
    }
    tables.table_versions[table.index()] = seq;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Thread-safe in-memory [`Store`].
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
    forced_aborts: AtomicU32,
}

impl MemoryStore {
    /// An empty store stamping commits with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// An empty store stamping commits with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
            forced_aborts: AtomicU32::new(0),
        }
    }

    /// Make the next `count` commits fail with `Aborted`.
    pub fn inject_aborts(&self, count: u32) {
        self.forced_aborts.store(count, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.lock().commit_seq
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_forced_abort(&self) -> bool {
        self.forced_aborts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("commits", &self.commit_count())
            .finish_non_exhaustive()
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> Box<dyn StoreTxn + '_> {
        Box::new(MemoryTxn {
            store: self,
            row_reads: HashMap::new(),
            table_reads: HashMap::new(),
            mutations: Vec::new(),
        })
    }

    fn snapshot(&self) -> Box<dyn ReadTxn + '_> {
        Box::new(MemorySnapshot {
            tables: self.lock().clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryTxn
// ---------------------------------------------------------------------------

struct MemoryTxn<'s> {
    store: &'s MemoryStore,
    row_reads: HashMap<RowKey, u64>,
    table_reads: HashMap<Table, u64>,
    mutations: Vec<Mutation>,
}

fn aborted(reason: String) -> EconomyError {
    EconomyError::Aborted { reason }
}

impl MemoryTxn<'_> {
    /// Run a point query while recording the row version.
    ///
    /// The whole read set is re-validated first, so every value this
    /// transaction has seen belongs to one committed state.
    fn point<T>(&mut self, key: RowKey, query: impl FnOnce(&Tables) -> T) -> Result<T> {
        let store = self.store;
        let tables = store.lock();
        self.validate(&tables)?;
        self.row_reads.entry(key).or_insert_with(|| tables.row_version(key));
        Ok(query(&*tables))
    }

    /// Run a scan while recording the versions of every table it touches.
    fn scan<T>(&mut self, touched: &[Table], query: impl FnOnce(&Tables) -> T) -> Result<T> {
        let store = self.store;
        let tables = store.lock();
        self.validate(&tables)?;
        for table in touched {
            self.table_reads.entry(*table).or_insert_with(|| tables.table_version(*table));
        }
        Ok(query(&*tables))
    }

    fn validate(&self, tables: &Tables) -> Result<()> {
        for (key, seen) in &self.row_reads {
            if tables.row_version(*key) != *seen {
                return Err(aborted(format!("{key:?} was modified by a concurrent commit")));
            }
        }
        for (table, seen) in &self.table_reads {
            if tables.table_version(*table) != *seen {
                return Err(aborted(format!("{table:?} was modified by a concurrent commit")));
            }
        }
        Ok(())
    }
}

impl ReadTxn for MemoryTxn<'_> {
    fn player(&mut self, id: PlayerId) -> Result<Option<Player>> {
        self.point(RowKey::Player(id), |t| t.player(id))
    }

    fn players(&mut self, ids: &[PlayerId]) -> Result<Vec<Player>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(player) = self.player(*id)? {
                found.push(player);
            }
        }
        Ok(found)
    }

    fn unassigned_players(&mut self, limit: usize) -> Result<Vec<Player>> {
        self.scan(&[Table::Players], |t| t.unassigned_players(limit))
    }

    fn funded_players_in_game(
        &mut self,
        exclude: PlayerId,
        min_balance: Decimal,
        limit: usize,
    ) -> Result<Vec<Player>> {
        self.scan(&[Table::Players], |t| {
            t.funded_players_in_game(exclude, min_balance, limit)
        })
    }

    fn game_item(&mut self, id: GameItemId) -> Result<Option<GameItem>> {
        self.point(RowKey::GameItem(id), |t| t.game_item(id))
    }

    fn player_item(&mut self, owner: PlayerId, id: PlayerItemId) -> Result<Option<PlayerItem>> {
        self.point(RowKey::PlayerItem(owner, id), |t| t.player_item(owner, id))
    }

    fn player_items(&mut self, owner: PlayerId) -> Result<Vec<PlayerItem>> {
        self.scan(&[Table::PlayerItems], |t| t.player_items(owner))
    }

    fn listable_items(&mut self, limit: usize) -> Result<Vec<PlayerItem>> {
        self.scan(&[Table::PlayerItems, Table::Players], |t| t.listable_items(limit))
    }

    fn trade_order(&mut self, id: OrderId) -> Result<Option<TradeOrder>> {
        self.point(RowKey::TradeOrder(id), |t| t.trade_order(id))
    }

    fn open_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>> {
        self.scan(&[Table::TradeOrders], |t| t.open_orders(now, limit))
    }

    fn due_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>> {
        self.scan(&[Table::TradeOrders], |t| t.due_orders(now, limit))
    }

    fn game(&mut self, id: GameId) -> Result<Option<Game>> {
        self.point(RowKey::Game(id), |t| t.game(id))
    }

    fn open_games(&mut self, limit: usize) -> Result<Vec<Game>> {
        self.scan(&[Table::Games], |t| t.open_games(limit))
    }

    fn ledger_entries(&mut self, player: PlayerId) -> Result<Vec<LedgerEntry>> {
        self.scan(&[Table::Ledger], |t| t.ledger_entries(player))
    }
}

impl WriteTxn for MemoryTxn<'_> {
    fn insert_player(&mut self, player: Player) {
        self.mutations.push(Mutation::InsertPlayer(player));
    }

    fn update_player(&mut self, player: Player) {
        self.mutations.push(Mutation::UpdatePlayer(player));
    }

    fn insert_game_item(&mut self, item: GameItem) {
        self.mutations.push(Mutation::InsertGameItem(item));
    }

    fn insert_player_item(&mut self, item: PlayerItem) {
        self.mutations.push(Mutation::InsertPlayerItem(item));
    }

    fn update_player_item(&mut self, item: PlayerItem) {
        self.mutations.push(Mutation::UpdatePlayerItem(item));
    }

    fn delete_player_item(&mut self, owner: PlayerId, id: PlayerItemId) {
        self.mutations.push(Mutation::DeletePlayerItem(owner, id));
    }

    fn insert_trade_order(&mut self, order: TradeOrder) {
        self.mutations.push(Mutation::InsertTradeOrder(order));
    }

    fn update_trade_order(&mut self, order: TradeOrder) {
        self.mutations.push(Mutation::UpdateTradeOrder(order));
    }

    fn insert_game(&mut self, game: Game) {
        self.mutations.push(Mutation::InsertGame(game));
    }

    fn update_game(&mut self, game: Game) {
        self.mutations.push(Mutation::UpdateGame(game));
    }

    fn append_ledger_entry(&mut self, posting: LedgerPosting) {
        self.mutations.push(Mutation::AppendLedger(posting));
    }
}

impl StoreTxn for MemoryTxn<'_> {
    fn as_write(&mut self) -> &mut dyn WriteTxn {
        self
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let store = self.store;
        if store.take_forced_abort() {
            return Err(aborted("injected abort".into()));
        }
        let mut tables = store.lock();
        self.validate(&tables)?;
        if self.mutations.is_empty() {
            return Ok(());
        }
        check_preconditions(&tables, &self.mutations)?;

        let seq = tables.commit_seq + 1;
        let now = store.clock.now();
        let MemoryTxn { mutations, .. } = *self;
        for mutation in mutations {
            apply(&mut tables, mutation, seq, now);
        }
        tables.commit_seq = seq;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySnapshot
// ---------------------------------------------------------------------------

/// A frozen copy of the committed tables.
struct MemorySnapshot {
    tables: Tables,
}

impl ReadTxn for MemorySnapshot {
    fn player(&mut self, id: PlayerId) -> Result<Option<Player>> {
        Ok(self.tables.player(id))
    }

    fn players(&mut self, ids: &[PlayerId]) -> Result<Vec<Player>> {
        Ok(ids.iter().filter_map(|id| self.tables.player(*id)).collect())
    }

    fn unassigned_players(&mut self, limit: usize) -> Result<Vec<Player>> {
        Ok(self.tables.unassigned_players(limit))
    }

    fn funded_players_in_game(
        &mut self,
        exclude: PlayerId,
        min_balance: Decimal,
        limit: usize,
    ) -> Result<Vec<Player>> {
        Ok(self.tables.funded_players_in_game(exclude, min_balance, limit))
    }

    fn game_item(&mut self, id: GameItemId) -> Result<Option<GameItem>> {
        Ok(self.tables.game_item(id))
    }

    fn player_item(&mut self, owner: PlayerId, id: PlayerItemId) -> Result<Option<PlayerItem>> {
        Ok(self.tables.player_item(owner, id))
    }

    fn player_items(&mut self, owner: PlayerId) -> Result<Vec<PlayerItem>> {
        Ok(self.tables.player_items(owner))
    }

    fn listable_items(&mut self, limit: usize) -> Result<Vec<PlayerItem>> {
        Ok(self.tables.listable_items(limit))
    }

    fn trade_order(&mut self, id: OrderId) -> Result<Option<TradeOrder>> {
        Ok(self.tables.trade_order(id))
    }

    fn open_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>> {
        Ok(self.tables.open_orders(now, limit))
    }

    fn due_orders(&mut self, now: DateTime<Utc>, limit: usize) -> Result<Vec<TradeOrder>> {
        Ok(self.tables.due_orders(now, limit))
    }

    fn game(&mut self, id: GameId) -> Result<Option<Game>> {
        Ok(self.tables.game(id))
    }

    fn open_games(&mut self, limit: usize) -> Result<Vec<Game>> {
        Ok(self.tables.open_games(limit))
    }

    fn ledger_entries(&mut self, player: PlayerId) -> Result<Vec<LedgerEntry>> {
        Ok(self.tables.ledger_entries(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(players: &[Player]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        for p in players {
            txn.insert_player(p.clone());
        }
        txn.commit().unwrap();
        store
    }

    #[test]
    fn writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let player = Player::dummy(Decimal::ONE);
        let mut txn = store.begin();
        txn.insert_player(player.clone());
        assert!(txn.player(player.id).unwrap().is_none());
        assert!(store.snapshot().player(player.id).unwrap().is_none());
        txn.commit().unwrap();
        let stored = store.snapshot().player(player.id).unwrap().unwrap();
        assert_eq!(stored.account_balance, Decimal::ONE);
        assert!(stored.updated.is_some());
    }

    #[test]
    fn dropped_transaction_has_no_effect() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin();
            txn.insert_player(Player::dummy(Decimal::ONE));
        }
        assert_eq!(store.commit_count(), 0);
        assert!(store.snapshot().unassigned_players(10).unwrap().is_empty());
    }

    #[test]
    fn stale_point_read_aborts_commit() {
        let player = Player::dummy(Decimal::TEN);
        let store = seeded(std::slice::from_ref(&player));

        let mut slow = store.begin();
        let mut p = slow.player(player.id).unwrap().unwrap();

        let mut fast = store.begin();
        let mut q = fast.player(player.id).unwrap().unwrap();
        q.account_balance = Decimal::ZERO;
        fast.update_player(q);
        fast.commit().unwrap();

        p.account_balance = Decimal::ONE;
        slow.update_player(p);
        let err = slow.commit().unwrap_err();
        assert!(err.is_transient_abort());
        let stored = store.snapshot().player(player.id).unwrap().unwrap();
        assert_eq!(stored.account_balance, Decimal::ZERO);
    }

    #[test]
    fn repeated_read_after_concurrent_write_aborts() {
        let player = Player::dummy(Decimal::TEN);
        let store = seeded(std::slice::from_ref(&player));

        let mut txn = store.begin();
        txn.player(player.id).unwrap();

        let mut other = store.begin();
        other.update_player(player.clone());
        other.commit().unwrap();

        assert!(txn.player(player.id).unwrap_err().is_transient_abort());
    }

    #[test]
    fn read_of_other_row_after_concurrent_write_aborts() {
        let player = Player::dummy(Decimal::TEN);
        let store = seeded(std::slice::from_ref(&player));
        let game = Game::new(GameId::new(), vec![player.id], Utc::now());
        let mut setup = store.begin();
        setup.insert_game(game.clone());
        setup.commit().unwrap();

        let mut txn = store.begin();
        assert!(txn.game(game.id).unwrap().unwrap().is_open());

        let mut closer = store.begin();
        let mut closed = game.clone();
        closed.close(player.id, Utc::now()).unwrap();
        closer.update_game(closed);
        closer.commit().unwrap();

        // The player row is untouched, but reading it would mix the open
        // game with state committed after it.
        assert!(txn.player(player.id).unwrap_err().is_transient_abort());
        assert!(txn.unassigned_players(10).unwrap_err().is_transient_abort());
    }

    #[test]
    fn scan_detects_phantom_insert() {
        let store = seeded(&[Player::dummy(Decimal::ONE)]);

        let mut txn = store.begin();
        assert_eq!(txn.unassigned_players(10).unwrap().len(), 1);

        let mut other = store.begin();
        other.insert_player(Player::dummy(Decimal::ONE));
        other.commit().unwrap();

        txn.insert_game(Game::new(GameId::new(), vec![], Utc::now()));
        assert!(txn.commit().unwrap_err().is_transient_abort());
    }

    #[test]
    fn duplicate_insert_is_storage_error_and_atomic() {
        let player = Player::dummy(Decimal::ONE);
        let store = seeded(std::slice::from_ref(&player));

        let fresh = Player::dummy(Decimal::ONE);
        let mut txn = store.begin();
        txn.insert_player(fresh.clone());
        txn.insert_player(player.clone());
        let err = txn.commit().unwrap_err();
        assert!(matches!(err, EconomyError::Storage(_)));
        assert!(store.snapshot().player(fresh.id).unwrap().is_none());
    }

    #[test]
    fn update_missing_row_is_storage_error() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        txn.update_game(Game::new(GameId::new(), vec![], Utc::now()));
        assert!(matches!(txn.commit().unwrap_err(), EconomyError::Storage(_)));
    }

    #[test]
    fn delete_missing_row_is_noop() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        txn.delete_player_item(PlayerId::new(), PlayerItemId::new());
        txn.commit().unwrap();
    }

    #[test]
    fn insert_then_delete_in_one_batch() {
        let owner = Player::dummy(Decimal::ONE);
        let store = seeded(std::slice::from_ref(&owner));
        let item = GameItem::dummy(Decimal::ONE);
        let held = PlayerItem::dummy(owner.id, &item);

        let mut txn = store.begin();
        txn.insert_player_item(held.clone());
        txn.delete_player_item(owner.id, held.id);
        txn.commit().unwrap();
        assert!(store.snapshot().player_items(owner.id).unwrap().is_empty());
    }

    #[test]
    fn injected_aborts_are_consumed() {
        let store = MemoryStore::new();
        store.inject_aborts(2);
        for _ in 0..2 {
            let txn = store.begin();
            assert!(txn.commit().unwrap_err().is_transient_abort());
        }
        store.begin().commit().unwrap();
    }

    #[test]
    fn ledger_entries_stamped_at_commit() {
        let store = MemoryStore::new();
        let player = PlayerId::new();
        let mut txn = store.begin();
        txn.append_ledger_entry(LedgerPosting {
            player,
            amount: Decimal::new(-314, 2),
            game_session: None,
            source: "test".into(),
        });
        txn.commit().unwrap();
        let entries = store.snapshot().ledger_entries(player).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, Decimal::new(-314, 2));
    }

    #[test]
    fn open_games_newest_first() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let older = Game::new(GameId::new(), vec![], t0);
        let newer = Game::new(GameId::new(), vec![], t0 + chrono::Duration::seconds(5));
        let mut closed = Game::new(GameId::new(), vec![PlayerId::new()], t0 + chrono::Duration::seconds(9));
        let winner = closed.players[0];
        closed.close(winner, t0).unwrap();

        let mut txn = store.begin();
        txn.insert_game(older.clone());
        txn.insert_game(newer.clone());
        txn.insert_game(closed);
        txn.commit().unwrap();

        let open = store.snapshot().open_games(10).unwrap();
        assert_eq!(open.iter().map(|g| g.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(store.snapshot().open_games(1).unwrap().len(), 1);
    }
}
