use alloy::sol;

sol! {
    /// Protocol fee manager.
    #[sol(rpc)]
    interface IFeeManager {
        // Errors
        error Fees__FeeTooHigh(uint256 requested, uint256 maximum);
        error Fees__NotFeeCollector(address caller);
        error Fees__ZeroAddress();
        error Fees__NothingToWithdraw();

        // Events
        event PlatformFeeUpdated(uint256 newFeeBps);
        event FeesWithdrawn(address indexed collector, uint256 amount);

        // Entrypoints
        function updatePlatformFee(uint256 newFeeBps) external;
        function withdrawFees(address to) external;

        // Views
        function platformFeeBps() external view returns (uint256);
        function maxFeeBps() external view returns (uint256);
        function feeCollector() external view returns (address);
    }
}
