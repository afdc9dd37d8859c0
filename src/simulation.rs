use crate::{
    change_door, create_game, determine_winner, open_goat_door, select_door, Content, Error, Game,
    Outcome, Result, Strategy,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// 单一策略的一轮游戏
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(try_from = "RawTrial")]
pub struct Trial {
    /// 门后内容
    game: Game,

    /// 挑战者最初选择的门序号
    initial_pick: u32,

    /// 主持人打开的门序号
    opened_door: u32,

    /// 挑战者最终选择的门序号
    final_pick: u32,

    /// 挑战者的策略
    strategy: Strategy,

    /// 结果
    outcome: Outcome,
}

#[derive(Deserialize)]
struct RawTrial {
    game: Game,
    initial_pick: u32,
    opened_door: u32,
    final_pick: u32,
    strategy: Strategy,
    outcome: Outcome,
}

impl TryFrom<RawTrial> for Trial {
    type Error = Error;

    fn try_from(raw: RawTrial) -> Result<Self> {
        Self::new(
            raw.game,
            raw.initial_pick,
            raw.opened_door,
            raw.final_pick,
            raw.strategy,
            raw.outcome,
        )
    }
}

impl Trial {
    /// 由已有记录构造一轮游戏，记录必须符合游戏规则：
    /// 主持人打开的是挑战者没选的山羊门，最终选择和结果与策略一致。
    pub fn new(
        game: Game,
        initial_pick: u32,
        opened_door: u32,
        final_pick: u32,
        strategy: Strategy,
        outcome: Outcome,
    ) -> Result<Self> {
        let expected = change_door(strategy, opened_door, initial_pick)?;
        if game.content(opened_door)? != Content::Goat {
            return Err(Error::InvalidArgument(format!(
                "host cannot open door {opened_door}, it holds the car"
            )));
        }
        if final_pick != expected {
            return Err(Error::InvalidArgument(format!(
                "final pick {final_pick} does not follow {strategy}, expected {expected}"
            )));
        }
        if outcome != determine_winner(final_pick, &game)? {
            return Err(Error::InvalidArgument(format!(
                "outcome {outcome:?} does not match door {final_pick}"
            )));
        }

        Ok(Self {
            game,
            initial_pick,
            opened_door,
            final_pick,
            strategy,
            outcome,
        })
    }

    /// 依次完成 创建 → 选择 → 揭示 → 抉择 → 判定
    pub fn run<R: Rng + ?Sized>(strategy: Strategy, rng: &mut R) -> Result<Self> {
        let game = create_game(rng);
        let initial_pick = select_door(rng);
        let opened_door = open_goat_door(&game, initial_pick, rng)?;
        let final_pick = change_door(strategy, opened_door, initial_pick)?;
        let outcome = determine_winner(final_pick, &game)?;
        trace!(?game, initial_pick, opened_door, final_pick, %strategy, ?outcome, "trial");

        Ok(Self {
            game,
            initial_pick,
            opened_door,
            final_pick,
            strategy,
            outcome,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn initial_pick(&self) -> u32 {
        self.initial_pick
    }

    pub fn opened_door(&self) -> u32 {
        self.opened_door
    }

    pub fn final_pick(&self) -> u32 {
        self.final_pick
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

/// 同一局游戏下两种策略各自的结果
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct Outcomes {
    pub stay: Outcome,
    pub switch: Outcome,
}

impl Outcomes {
    pub fn get(&self, strategy: Strategy) -> Outcome {
        match strategy {
            Strategy::Stay => self.stay,
            Strategy::Switch => self.switch,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Strategy, Outcome)> + '_ {
        Strategy::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

/// 一局游戏，两种策略在同一次揭示之后分别判定，结果是相关的
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct Play {
    game: Game,
    initial_pick: u32,
    opened_door: u32,
    outcomes: Outcomes,
}

impl Play {
    pub fn run<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let game = create_game(rng);
        let initial_pick = select_door(rng);
        let opened_door = open_goat_door(&game, initial_pick, rng)?;

        let judge = |strategy| {
            let final_pick = change_door(strategy, opened_door, initial_pick)?;
            determine_winner(final_pick, &game)
        };
        let outcomes = Outcomes {
            stay: judge(Strategy::Stay)?,
            switch: judge(Strategy::Switch)?,
        };

        Ok(Self {
            game,
            initial_pick,
            opened_door,
            outcomes,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn initial_pick(&self) -> u32 {
        self.initial_pick
    }

    pub fn opened_door(&self) -> u32 {
        self.opened_door
    }

    pub fn outcomes(&self) -> Outcomes {
        self.outcomes
    }
}

/// 一批游戏的统计结果
#[derive(Debug, Default, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct BatchSummary {
    /// 总轮数
    trials: u32,
    /// 第一次就选中汽车的轮数
    initial_pick_win: u32,
    /// 坚持选择的轮数
    stay: u32,
    /// 坚持选择后赢的轮数
    stay_win: u32,
    /// 改变选择的轮数
    switch: u32,
    /// 改变选择后赢的轮数
    switch_win: u32,
}

impl BatchSummary {
    pub fn calculate<T>(trials: T) -> Self
    where
        T: AsRef<[Trial]>,
    {
        let mut summary = Self::default();
        for trial in trials.as_ref() {
            summary.record(trial);
        }
        summary
    }

    fn record(&mut self, trial: &Trial) {
        self.trials += 1;
        if trial.game.car() == trial.initial_pick {
            self.initial_pick_win += 1;
        }

        let win = u32::from(trial.outcome.is_win());
        match trial.strategy {
            Strategy::Stay => {
                self.stay += 1;
                self.stay_win += win;
            }
            Strategy::Switch => {
                self.switch += 1;
                self.switch_win += win;
            }
        }
    }

    fn merge(&mut self, other: &BatchSummary) {
        self.trials += other.trials;
        self.initial_pick_win += other.initial_pick_win;
        self.stay += other.stay;
        self.stay_win += other.stay_win;
        self.switch += other.switch;
        self.switch_win += other.switch_win;
    }

    /// 总轮数
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// 第一次就选中汽车的轮数
    pub fn initial_pick_win(&self) -> u32 {
        self.initial_pick_win
    }

    /// 赢的总轮数
    pub fn win(&self) -> u32 {
        self.stay_win + self.switch_win
    }

    /// 使用某个策略的轮数
    pub fn played(&self, strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Stay => self.stay,
            Strategy::Switch => self.switch,
        }
    }

    /// 使用某个策略赢的轮数
    pub fn wins(&self, strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Stay => self.stay_win,
            Strategy::Switch => self.switch_win,
        }
    }

    /// 第一次就选中汽车的比例，没有任何轮次时为 `None`
    pub fn initial_pick_rate(&self) -> Option<f64> {
        ratio(self.initial_pick_win, self.trials)
    }

    /// 所有轮次的胜率，没有任何轮次时为 `None`
    pub fn win_rate(&self) -> Option<f64> {
        ratio(self.win(), self.trials)
    }

    /// 某个策略的胜率，该策略没有玩过时为 `None`
    pub fn strategy_win_rate(&self, strategy: Strategy) -> Option<f64> {
        ratio(self.wins(strategy), self.played(strategy))
    }
}

fn ratio(part: u32, total: u32) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}

/// 按顺序保存的一批游戏记录及其统计
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "RawBatch")]
pub struct SimulationBatch {
    trials: Vec<Trial>,
    summary: BatchSummary,
}

// 统计总是由记录重新计算，忽略输入里的 `summary`
#[derive(Deserialize)]
struct RawBatch {
    trials: Vec<Trial>,
}

impl From<RawBatch> for SimulationBatch {
    fn from(raw: RawBatch) -> Self {
        Self::from(raw.trials)
    }
}

impl SimulationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trial: Trial) {
        self.summary.record(&trial);
        self.trials.push(trial);
    }

    /// 把另一批游戏接在后面
    pub fn append(&mut self, mut other: SimulationBatch) {
        self.summary.merge(&other.summary);
        self.trials.append(&mut other.trials);
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn into_trials(self) -> Vec<Trial> {
        self.trials
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// 每轮赢记 1、输记 0 的平均值
    pub fn win_rate(&self) -> Option<f64> {
        self.summary.win_rate()
    }

    pub fn strategy_win_rate(&self, strategy: Strategy) -> Option<f64> {
        self.summary.strategy_win_rate(strategy)
    }
}

impl From<Vec<Trial>> for SimulationBatch {
    fn from(trials: Vec<Trial>) -> Self {
        let summary = BatchSummary::calculate(&trials);
        Self { trials, summary }
    }
}

impl Extend<Trial> for SimulationBatch {
    fn extend<I: IntoIterator<Item = Trial>>(&mut self, iter: I) {
        for trial in iter {
            self.push(trial);
        }
    }
}

impl FromIterator<Trial> for SimulationBatch {
    fn from_iter<I: IntoIterator<Item = Trial>>(iter: I) -> Self {
        let mut batch = Self::new();
        batch.extend(iter);
        batch
    }
}

/// 模拟器，持有注入的随机数源
#[derive(Debug, Clone)]
pub struct Simulator<R = SmallRng> {
    rng: R,
}

impl Simulator<SmallRng> {
    /// 使用固定种子，结果可复现
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }
}

impl<R: Rng> Simulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 玩一局，两种策略都在这一局上判定
    pub fn play_one(&mut self) -> Result<Play> {
        Play::run(&mut self.rng)
    }

    /// 用给定策略玩一轮
    pub fn play_trial(&mut self, strategy: Strategy) -> Result<Trial> {
        Trial::run(strategy, &mut self.rng)
    }

    /// 用给定策略玩 `n` 轮互相独立的游戏
    pub fn play_n(&mut self, n: u32, strategy: Strategy) -> Result<SimulationBatch> {
        simulate_n_games(n, strategy, &mut self.rng)
    }
}

/// 随机玩一局，返回两种策略各自的结果
pub fn play_game<R: Rng + ?Sized>(rng: &mut R) -> Result<Play> {
    Play::run(rng)
}

/// 用给定策略模拟 `n` 轮游戏，`n` 必须大于 0
pub fn simulate_n_games<R: Rng + ?Sized>(
    n: u32,
    strategy: Strategy,
    rng: &mut R,
) -> Result<SimulationBatch> {
    check_trials(n)?;
    debug!(%strategy, trials = n, "simulating batch");
    let batch = (0..n)
        .map(|_| Trial::run(strategy, rng))
        .collect::<Result<SimulationBatch>>()?;
    log_batch(&batch);
    Ok(batch)
}

/// 并行模拟 `n` 轮游戏。第 `i` 轮使用种子 `seed + i`，结果与线程数无关。
pub fn par_simulate_n_games(n: u32, strategy: Strategy, seed: u64) -> Result<SimulationBatch> {
    check_trials(n)?;
    debug!(%strategy, trials = n, seed, "simulating batch in parallel");
    let trials = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(u64::from(i)));
            Trial::run(strategy, &mut rng)
        })
        .collect::<Result<Vec<Trial>>>()?;
    let batch = SimulationBatch::from(trials);
    log_batch(&batch);
    Ok(batch)
}

fn check_trials(n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "number of trials must be positive".to_string(),
        ));
    }
    Ok(())
}

fn log_batch(batch: &SimulationBatch) {
    let summary = batch.summary();
    debug!(
        trials = summary.trials(),
        initial_pick_win = summary.initial_pick_win(),
        stay_win = summary.wins(Strategy::Stay),
        switch_win = summary.wins(Strategy::Switch),
        win_rate = summary.win_rate().unwrap_or_default(),
        "batch finished"
    );
}
