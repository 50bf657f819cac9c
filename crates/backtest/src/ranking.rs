//! Contract ranking for one expiration cycle.
//!
//! Candidates are the quotes observed on the calendar day before expiration.
//! Each is scored according to the ranking policy and the list is stably
//! sorted, so equal scores keep their input order. The ranker holds no state
//! between cycles.

use chrono::{Days, NaiveDate};
use expiry_trade_core::{OptionQuote, RankingPolicy, StrategyConfig};
use expiry_trade_data::MarketDataStore;
use rust_decimal::Decimal;

/// A candidate quote together with its ranking score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedQuote<'a> {
    pub quote: &'a OptionQuote,
    pub score: Decimal,
}

/// Price and size on the side of the book an order fills against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTerms {
    pub price: Decimal,
    pub size: u64,
}

impl FillTerms {
    /// Zero price or zero size means the quote cannot be traded.
    #[must_use]
    pub fn is_tradable(&self) -> bool {
        self.size > 0 && self.price > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContractRanker {
    policy: RankingPolicy,
    threshold: Decimal,
}

impl ContractRanker {
    #[must_use]
    pub const fn new(policy: RankingPolicy, threshold: Decimal) -> Self {
        Self { policy, threshold }
    }

    #[must_use]
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.ranking_policy, config.threshold)
    }

    #[must_use]
    pub const fn policy(&self) -> RankingPolicy {
        self.policy
    }

    #[must_use]
    pub const fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Observation date whose quotes are ranked for `expiration`.
    #[must_use]
    pub fn trading_day_before(expiration: NaiveDate) -> NaiveDate {
        expiration
            .checked_sub_days(Days::new(1))
            .unwrap_or(expiration)
    }

    #[must_use]
    pub fn score(&self, quote: &OptionQuote) -> Decimal {
        match self.policy {
            RankingPolicy::DeviateAscending => quote.moneyness_signed(),
            RankingPolicy::SpreadAdjustedDescending => quote.moneyness_signed() - quote.ask_price,
        }
    }

    /// Whether a score still passes the threshold. The first failing score in
    /// a ranked list ends the cycle's allocation.
    #[must_use]
    pub fn is_eligible(&self, score: Decimal) -> bool {
        match self.policy {
            RankingPolicy::DeviateAscending => score <= self.threshold,
            RankingPolicy::SpreadAdjustedDescending => score >= self.threshold,
        }
    }

    /// Bid side for selling, ask side for buying.
    #[must_use]
    pub fn fill_terms(&self, quote: &OptionQuote) -> FillTerms {
        match self.policy {
            RankingPolicy::DeviateAscending => FillTerms {
                price: quote.bid_price,
                size: quote.bid_size,
            },
            RankingPolicy::SpreadAdjustedDescending => FillTerms {
                price: quote.ask_price,
                size: quote.ask_size,
            },
        }
    }

    /// Scores and stably sorts `quotes` in policy order.
    #[must_use]
    pub fn rank_quotes<'a, I>(&self, quotes: I) -> Vec<RankedQuote<'a>>
    where
        I: IntoIterator<Item = &'a OptionQuote>,
    {
        let mut ranked: Vec<RankedQuote<'a>> = quotes
            .into_iter()
            .map(|quote| RankedQuote {
                quote,
                score: self.score(quote),
            })
            .collect();

        // slice::sort_by is stable
        match self.policy {
            RankingPolicy::DeviateAscending => ranked.sort_by(|a, b| a.score.cmp(&b.score)),
            RankingPolicy::SpreadAdjustedDescending => ranked.sort_by(|a, b| b.score.cmp(&a.score)),
        }
        ranked
    }

    /// Ranked candidates for one expiration cycle.
    #[must_use]
    pub fn rank<'a>(
        &self,
        store: &'a MarketDataStore,
        expiration: NaiveDate,
    ) -> Vec<RankedQuote<'a>> {
        let observed = Self::trading_day_before(expiration);
        let ranked = self.rank_quotes(store.quotes_on_date(observed, expiration));
        tracing::debug!(
            %expiration,
            %observed,
            candidates = ranked.len(),
            best_score = ?ranked.first().map(|r| r.score),
            "Contracts ranked"
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, date, store, QuoteBuilder};
    use expiry_trade_core::OptionType;
    use rust_decimal_macros::dec;

    fn selling() -> ContractRanker {
        ContractRanker::new(RankingPolicy::DeviateAscending, dec!(-150))
    }

    fn buying() -> ContractRanker {
        ContractRanker::new(RankingPolicy::SpreadAdjustedDescending, dec!(20))
    }

    #[test]
    fn selling_sorts_deepest_out_of_the_money_first() {
        let quotes = vec![
            QuoteBuilder::new(OptionType::Put, dec!(4700), dec!(4800)).id("p4700").build(),
            QuoteBuilder::new(OptionType::Call, dec!(5000), dec!(4800)).id("c5000").build(),
            QuoteBuilder::new(OptionType::Put, dec!(4500), dec!(4800)).id("p4500").build(),
        ];
        let ranked = selling().rank_quotes(&quotes);
        let ids: Vec<_> = ranked.iter().map(|r| r.quote.contract_id.as_str()).collect();
        assert_eq!(ids, vec!["p4500", "c5000", "p4700"]);
        let scores: Vec<_> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![dec!(-300), dec!(-200), dec!(-100)]);
    }

    #[test]
    fn buying_sorts_descending_on_spread_adjusted_score() {
        let quote = |option_type: OptionType, strike: Decimal, ask: Decimal, id: &str| {
            QuoteBuilder::new(option_type, strike, dec!(4800))
                .ask(ask, 5)
                .id(id)
                .build()
        };
        let quotes = vec![
            quote(OptionType::Call, dec!(4750), dec!(10), "a"),
            quote(OptionType::Call, dec!(4700), dec!(60), "b"),
            quote(OptionType::Put, dec!(4900), dec!(30), "c"),
        ];
        let ranked = buying().rank_quotes(&quotes);
        let scores: Vec<_> = ranked.iter().map(|r| r.score).collect();
        // a: 50 - 10, b: 100 - 60, c: 100 - 30
        assert_eq!(scores, vec![dec!(70), dec!(40), dec!(40)]);
        assert_eq!(ranked[0].quote.contract_id, "c");
        // Tie between a and b keeps input order.
        assert_eq!(ranked[1].quote.contract_id, "a");
        assert_eq!(ranked[2].quote.contract_id, "b");
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let quotes: Vec<_> = ["first", "second", "third"]
            .iter()
            .map(|id| QuoteBuilder::new(OptionType::Put, dec!(4600), dec!(4800)).id(id).build())
            .collect();
        let ranked = selling().rank_quotes(&quotes);
        let ids: Vec<_> = ranked.iter().map(|r| r.quote.contract_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn eligibility_direction_follows_policy() {
        assert!(selling().is_eligible(dec!(-150)));
        assert!(selling().is_eligible(dec!(-400)));
        assert!(!selling().is_eligible(dec!(-149.99)));
        assert!(buying().is_eligible(dec!(20)));
        assert!(!buying().is_eligible(dec!(19.5)));
    }

    #[test]
    fn in_the_money_put_is_not_eligible_for_selling() {
        // -(4800 - 5000) = 200, well above the -150 cutoff.
        let quote = QuoteBuilder::new(OptionType::Put, dec!(5000), dec!(4800))
            .bid(dec!(10), 5)
            .build();
        let ranker = selling();
        assert_eq!(ranker.score(&quote), dec!(200));
        assert!(!ranker.is_eligible(ranker.score(&quote)));
    }

    #[test]
    fn fill_terms_use_policy_side() {
        let quote = QuoteBuilder::new(OptionType::Call, dec!(4900), dec!(4800))
            .bid(dec!(1.5), 7)
            .ask(dec!(1.7), 0)
            .build();
        assert_eq!(selling().fill_terms(&quote), FillTerms { price: dec!(1.5), size: 7 });
        assert!(selling().fill_terms(&quote).is_tradable());
        assert!(!buying().fill_terms(&quote).is_tradable());
    }

    #[test]
    fn rank_uses_quotes_from_the_day_before_expiration() {
        let quotes = vec![
            QuoteBuilder::new(OptionType::Put, dec!(4600), dec!(4800)).id("day-before").build(),
            QuoteBuilder::new(OptionType::Put, dec!(4500), dec!(4800))
                .id("two-days-before")
                .observed(at(3, 15, 0))
                .build(),
            QuoteBuilder::new(OptionType::Put, dec!(4400), dec!(4800))
                .id("other-expiry")
                .expiring(date(12))
                .build(),
        ];
        let store = store(quotes, &[]);
        let ranked = selling().rank(&store, date(5));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].quote.contract_id, "day-before");
        assert_eq!(ContractRanker::trading_day_before(date(5)), date(4));
    }
}
