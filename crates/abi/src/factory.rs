use alloy::sol;

sol! {
    /// Parameters for deploying a new escrow instance.
    struct EscrowParams {
        address client;
        address agent;
        address token;
        uint256 amount;
        uint64 deadline;
        string title;
        string description;
    }

    #[sol(rpc)]
    interface IEscrowFactory {
        // Errors
        error Factory__TitleTooLong(uint256 length, uint256 maxLength);
        error Factory__DescriptionTooLong(uint256 length, uint256 maxLength);
        error Factory__InvalidParameters();
        error Factory__ZeroAmount();
        error Factory__TokenNotAllowed(address token);
        error Factory__DeadlineInPast();

        // Events
        event EscrowDeployed(address indexed escrow, address indexed client, address indexed agent);

        // Entrypoints
        function deployEscrow(EscrowParams calldata params) external returns (address escrow);

        // Views
        function escrowCount() external view returns (uint256);
        function maxTitleLength() external view returns (uint256);
        function maxDescriptionLength() external view returns (uint256);
    }
}
