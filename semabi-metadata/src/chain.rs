//! The chain-name set a semantic ABI may target (§6), each with its native-token
//! sentinel address used to tag synthetic native-value transfers (§4.4).

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvmChain {
    Ethereum,
    Arbitrum,
    Base,
    Bnb,
    Optimism,
    Polygon,
    PolygonZkevm,
    AvalancheC,
    Tron,
    ZksyncEra,
    Stability,
    StabilityTestnet,
}

impl EvmChain {
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "ethereum" => Ok(EvmChain::Ethereum),
            "arbitrum" => Ok(EvmChain::Arbitrum),
            "base" => Ok(EvmChain::Base),
            "bnb" => Ok(EvmChain::Bnb),
            "optimism" => Ok(EvmChain::Optimism),
            "polygon" => Ok(EvmChain::Polygon),
            "polygon_zkevm" => Ok(EvmChain::PolygonZkevm),
            "avalanche_c" => Ok(EvmChain::AvalancheC),
            "tron" => Ok(EvmChain::Tron),
            "zksync_era" => Ok(EvmChain::ZksyncEra),
            "stability" => Ok(EvmChain::Stability),
            "stability_testnet" => Ok(EvmChain::StabilityTestnet),
            other => Err(Error::UnknownChain(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvmChain::Ethereum => "ethereum",
            EvmChain::Arbitrum => "arbitrum",
            EvmChain::Base => "base",
            EvmChain::Bnb => "bnb",
            EvmChain::Optimism => "optimism",
            EvmChain::Polygon => "polygon",
            EvmChain::PolygonZkevm => "polygon_zkevm",
            EvmChain::AvalancheC => "avalanche_c",
            EvmChain::Tron => "tron",
            EvmChain::ZksyncEra => "zksync_era",
            EvmChain::Stability => "stability",
            EvmChain::StabilityTestnet => "stability_testnet",
        }
    }

    /// The sentinel address `TokenTransferStep` uses to tag a synthetic transfer
    /// derived from a trace leg's native value rather than a token log (§4.4). Each
    /// chain has its own singleton, matching the convention its block explorers use
    /// for the chain's native coin.
    pub fn native_sentinel(&self) -> &'static str {
        match self {
            EvmChain::Arbitrum
            | EvmChain::Base
            | EvmChain::Ethereum
            | EvmChain::Optimism
            | EvmChain::ZksyncEra
            | EvmChain::Stability
            | EvmChain::StabilityTestnet => "0x1111111111111111111111111111111111111111",
            EvmChain::AvalancheC => "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7",
            EvmChain::Bnb => "0xb8c77482e45f1f44de1745f52c74426c631bdd52",
            EvmChain::Polygon | EvmChain::PolygonZkevm => "0x0000000000000000000000000000000000001010",
            EvmChain::Tron => "0x2222222222222222222222222222222222222222",
        }
    }
}
