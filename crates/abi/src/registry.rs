use alloy::sol;

sol! {
    /// Agent registry: agents stake protocol tokens to take escrow work.
    #[sol(rpc)]
    interface IAgentRegistry {
        // Errors
        error Registry__AgentAlreadyRegistered(address agent);
        error Registry__AgentNotRegistered(address agent);
        error Registry__InsufficientStake();
        error Registry__StakeLocked();
        error Registry__StakeBelowMinimum();
        error Registry__ProfileUriEmpty();
        error Registry__AgentSuspended();

        // Events
        event AgentRegistered(address indexed agent, string profileUri);
        event StakeDeposited(address indexed agent, uint256 amount);
        event StakeWithdrawn(address indexed agent, uint256 amount);

        // Entrypoints
        function registerAgent(string calldata profileUri) external;
        function updateProfile(string calldata profileUri) external;
        function stake(uint256 amount) external;
        function stakeWithPermit(
            uint256 amount,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function unstake(uint256 amount) external;

        // Views
        function isRegistered(address agent) external view returns (bool);
        function stakeOf(address agent) external view returns (uint256);
        function minimumStake() external view returns (uint256);
    }
}
