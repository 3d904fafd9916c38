//! SafetyToken interface
//! Reward token paid out by the review contract; only read from here
use ethers::prelude::*;

abigen!(
    SafetyToken,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function name() external view returns (string)
    ]"#,
);
