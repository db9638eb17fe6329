//! Centralized Contract Definitions
//!
//! All Solidity interfaces the liquidity seeder talks to, defined with
//! alloy's `sol!` macro. Each interface is annotated with `#[sol(rpc)]`
//! so contract instances can make RPC calls through any alloy Provider.
//!
//! Two AMM variants are covered:
//! - Fee-tiered (Uniswap V3 style): factory keyed by (token0, token1, fee)
//! - Single-tier (Algebra style): one pool per pair, dynamic fees
//!
//! Author: AI-Generated
//! Created: 2026-08-10

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);

        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

// ── Fee-tiered AMM (Uniswap V3 style) ────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
        function createPool(address tokenA, address tokenB, uint24 fee) external returns (address pool);

        event PoolCreated(address indexed token0, address indexed token1, uint24 indexed fee, int24 tickSpacing, address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
        function initialize(uint160 sqrtPriceX96) external;
        function tickSpacing() external view returns (int24);
        function token0() external view returns (address);
        function token1() external view returns (address);

        event Initialize(uint160 sqrtPriceX96, int24 tick);
    }
}

sol! {
    #[sol(rpc)]
    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        function createAndInitializePoolIfNecessary(address token0, address token1, uint24 fee, uint160 sqrtPriceX96) external payable returns (address pool);
        function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

// ── Single-tier AMM (Algebra style) ──────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IAlgebraFactory {
        function poolByPair(address tokenA, address tokenB) external view returns (address pool);
        function createPool(address tokenA, address tokenB) external returns (address pool);

        event Pool(address indexed token0, address indexed token1, address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface IAlgebraPool {
        function globalState() external view returns (uint160 price, int24 tick, uint16 fee, uint16 timepointIndex, uint8 communityFeeToken0, uint8 communityFeeToken1, bool unlocked);
        function initialize(uint160 initialPrice) external;
        function tickSpacing() external view returns (int24);
        function token0() external view returns (address);
        function token1() external view returns (address);

        event Initialize(uint160 price, int24 tick);
    }
}

sol! {
    #[sol(rpc)]
    interface IAlgebraPositionManager {
        struct MintParams {
            address token0;
            address token1;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        function createAndInitializePoolIfNecessary(address token0, address token1, uint160 sqrtPriceX96) external payable returns (address pool);
        function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

// ── Futarchy proposal + split/merge adapter ──────────────────────────

sol! {
    #[sol(rpc)]
    interface IFutarchyProposal {
        function collateralToken1() external view returns (address);
        function collateralToken2() external view returns (address);
        function numOutcomes() external view returns (uint256);
        function wrappedOutcome(uint256 index) external view returns (address wrapped1155, bytes data);
        function marketOpeningTime() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IFutarchyRouter {
        function splitPosition(address proposal, address collateralToken, uint256 amount) external;
        function mergePositions(address proposal, address collateralToken, uint256 amount) external;
    }
}
